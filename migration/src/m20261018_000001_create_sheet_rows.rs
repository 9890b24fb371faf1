use sea_orm_migration::prelude::*;

/// 表格行存储 (每个逻辑表 = 一个 sheet, 每行 = 一个 JSON 单元格数组)
#[derive(DeriveIden)]
enum SheetRows {
    Table,
    Id,
    Sheet,
    RowIndex,
    Cells,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// sheet 取值: users / characters / logs / summary
/// row_index 从 0 开始, 0 为表头行
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SheetRows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SheetRows::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SheetRows::Sheet).string_len(64).not_null())
                    .col(ColumnDef::new(SheetRows::RowIndex).integer().not_null())
                    .col(ColumnDef::new(SheetRows::Cells).json().not_null())
                    .col(
                        ColumnDef::new(SheetRows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // unique (sheet, row_index)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_sheet_rows_sheet_row_index")
                    .table(SheetRows::Table)
                    .col(SheetRows::Sheet)
                    .col(SheetRows::RowIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SheetRows::Table).to_owned())
            .await?;
        Ok(())
    }
}
