use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 表格行实体
/// 说明:
/// - sheet: 逻辑表名 (users / characters / logs / summary)
/// - row_index: 行号, 从 0 开始, 0 为表头
/// - cells: 单元格 JSON 数组, 值保持写入时的原始类型
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sheet_rows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sheet: String,
    pub row_index: i32,
    pub cells: Json,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
