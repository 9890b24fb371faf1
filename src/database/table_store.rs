//! 表格存储抽象
//!
//! 每个逻辑表是一组有序的行，第 0 行为表头。只支持整表读取、按下标写单元格和追加行，
//! 没有行级锁，也没有多行事务；调用方需持有全局事务锁。

use super::cell::{Cell, Row};
use super::{MemoryTableStore, SheetTableStore};
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Characters,
    Logs,
    Summary,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Users, Table::Characters, Table::Logs, Table::Summary];

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Characters => "characters",
            Table::Logs => "logs",
            Table::Summary => "summary",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Table::Users => &["userId", "tickets", "createdAt", "lastLoginAt"],
            Table::Characters => &["charId", "name", "rarity", "weight", "imageUrl", "enabled"],
            Table::Logs => &[
                "timestamp",
                "userId",
                "drawType",
                "cost",
                "resultIndex",
                "charId",
                "auditToken",
                "requestId",
            ],
            Table::Summary => &["timestamp", "userId", "drawType", "cost", "resultCharIds"],
        }
    }

    pub fn header_row(&self) -> Row {
        self.header()
            .iter()
            .map(|h| Cell::String((*h).to_string()))
            .collect()
    }
}

#[allow(async_fn_in_trait)]
pub trait TableStore {
    /// 读取整张表（含表头）
    async fn read_all(&self, table: Table) -> AppResult<Vec<Row>>;

    /// 覆盖单个单元格，row / col 均从 0 开始
    async fn write_cell(&self, table: Table, row: usize, col: usize, value: Cell)
    -> AppResult<()>;

    async fn append_row(&self, table: Table, values: Row) -> AppResult<()>;

    async fn append_rows(&self, table: Table, rows: Vec<Row>) -> AppResult<()>;
}

/// 运行时选择的存储后端
#[derive(Clone)]
pub enum TableStoreBackend {
    Sheet(SheetTableStore),
    Memory(MemoryTableStore),
}

impl TableStore for TableStoreBackend {
    async fn read_all(&self, table: Table) -> AppResult<Vec<Row>> {
        match self {
            TableStoreBackend::Sheet(s) => s.read_all(table).await,
            TableStoreBackend::Memory(s) => s.read_all(table).await,
        }
    }

    async fn write_cell(
        &self,
        table: Table,
        row: usize,
        col: usize,
        value: Cell,
    ) -> AppResult<()> {
        match self {
            TableStoreBackend::Sheet(s) => s.write_cell(table, row, col, value).await,
            TableStoreBackend::Memory(s) => s.write_cell(table, row, col, value).await,
        }
    }

    async fn append_row(&self, table: Table, values: Row) -> AppResult<()> {
        match self {
            TableStoreBackend::Sheet(s) => s.append_row(table, values).await,
            TableStoreBackend::Memory(s) => s.append_row(table, values).await,
        }
    }

    async fn append_rows(&self, table: Table, rows: Vec<Row>) -> AppResult<()> {
        match self {
            TableStoreBackend::Sheet(s) => s.append_rows(table, rows).await,
            TableStoreBackend::Memory(s) => s.append_rows(table, rows).await,
        }
    }
}
