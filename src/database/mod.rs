pub mod bootstrap;
pub mod cell;
pub mod connection;
pub mod memory_store;
pub mod sheet_store;
pub mod table_store;

pub use bootstrap::ensure_tables;
pub use cell::{Cell, Row};
pub use connection::{create_pool, run_migrations};
pub use memory_store::MemoryTableStore;
pub use sheet_store::SheetTableStore;
pub use table_store::{Table, TableStore, TableStoreBackend};
