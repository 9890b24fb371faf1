use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;

use super::cell::{Cell, Row};
use super::table_store::{Table, TableStore};
use crate::entities::sheet_row_entity as rows;
use crate::error::{AppError, AppResult};

/// 基于 `sheet_rows` 表的表格存储：每个逻辑表的每一行存为一条记录，单元格为 JSON 数组
#[derive(Clone)]
pub struct SheetTableStore {
    pool: DatabaseConnection,
}

impl SheetTableStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    // 行只追加不删除，行数即下一个行号
    async fn next_row_index<C: ConnectionTrait>(conn: &C, table: Table) -> AppResult<i32> {
        let count = rows::Entity::find()
            .filter(rows::Column::Sheet.eq(table.sheet_name()))
            .count(conn)
            .await?;
        i32::try_from(count).map_err(|_| {
            AppError::StorageError(format!("sheet {} is too large", table.sheet_name()))
        })
    }

    fn new_row(table: Table, row_index: i32, values: Row) -> rows::ActiveModel {
        rows::ActiveModel {
            sheet: Set(table.sheet_name().to_string()),
            row_index: Set(row_index),
            cells: Set(Value::Array(values)),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        }
    }

    fn cells_of(model: &rows::Model) -> AppResult<Row> {
        match &model.cells {
            Value::Array(cells) => Ok(cells.clone()),
            other => Err(AppError::StorageError(format!(
                "row {} of sheet {} is not an array: {other}",
                model.row_index, model.sheet
            ))),
        }
    }
}

impl TableStore for SheetTableStore {
    async fn read_all(&self, table: Table) -> AppResult<Vec<Row>> {
        let models = rows::Entity::find()
            .filter(rows::Column::Sheet.eq(table.sheet_name()))
            .order_by_asc(rows::Column::RowIndex)
            .all(&self.pool)
            .await?;
        models.iter().map(Self::cells_of).collect()
    }

    async fn write_cell(&self, table: Table, row: usize, col: usize, value: Cell) -> AppResult<()> {
        let missing = || {
            AppError::StorageError(format!(
                "row {row} does not exist in sheet {}",
                table.sheet_name()
            ))
        };
        let row_index = i32::try_from(row).map_err(|_| missing())?;

        let model = rows::Entity::find()
            .filter(rows::Column::Sheet.eq(table.sheet_name()))
            .filter(rows::Column::RowIndex.eq(row_index))
            .one(&self.pool)
            .await?
            .ok_or_else(missing)?;

        let mut cells = Self::cells_of(&model)?;
        if cells.len() <= col {
            cells.resize(col + 1, Cell::Null);
        }
        cells[col] = value;

        let mut am = model.into_active_model();
        am.cells = Set(Value::Array(cells));
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;
        Ok(())
    }

    async fn append_row(&self, table: Table, values: Row) -> AppResult<()> {
        self.append_rows(table, vec![values]).await
    }

    async fn append_rows(&self, table: Table, new_rows: Vec<Row>) -> AppResult<()> {
        if new_rows.is_empty() {
            return Ok(());
        }
        let txn = self.pool.begin().await?;
        let start = Self::next_row_index(&txn, table).await?;
        let models: Vec<rows::ActiveModel> = new_rows
            .into_iter()
            .zip(start..)
            .map(|(values, idx)| Self::new_row(table, idx, values))
            .collect();
        rows::Entity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
