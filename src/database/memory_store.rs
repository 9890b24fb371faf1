use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::cell::{Cell, Row};
use super::table_store::{Table, TableStore};
use crate::error::{AppError, AppResult};

/// 进程内表格存储，用于测试和 `store = "memory"` 模式
#[derive(Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<RwLock<HashMap<Table, Vec<Row>>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::InternalError("memory table store lock poisoned".into())
    }
}

impl TableStore for MemoryTableStore {
    async fn read_all(&self, table: Table) -> AppResult<Vec<Row>> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }

    async fn write_cell(&self, table: Table, row: usize, col: usize, value: Cell) -> AppResult<()> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let target = tables
            .get_mut(&table)
            .and_then(|rows| rows.get_mut(row))
            .ok_or_else(|| {
                AppError::StorageError(format!(
                    "row {row} does not exist in sheet {}",
                    table.sheet_name()
                ))
            })?;
        if target.len() <= col {
            target.resize(col + 1, Cell::Null);
        }
        target[col] = value;
        Ok(())
    }

    async fn append_row(&self, table: Table, values: Row) -> AppResult<()> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        tables.entry(table).or_default().push(values);
        Ok(())
    }

    async fn append_rows(&self, table: Table, rows: Vec<Row>) -> AppResult<()> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        tables.entry(table).or_default().extend(rows);
        Ok(())
    }
}
