pub mod sheet_rows;

pub use sheet_rows as sheet_row_entity;
