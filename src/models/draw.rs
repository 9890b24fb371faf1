use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::Character;
use crate::database::Row;
use crate::database::cell::{datetime_cell, row_datetime, row_i64, row_string};
use crate::error::{AppError, AppResult};

/// 抽卡类型: 单抽 (1 票 1 次) / 十连 (10 票 10 次)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DrawType {
    Single,
    Ten,
}

impl DrawType {
    pub fn cost(&self) -> i64 {
        match self {
            DrawType::Single => 1,
            DrawType::Ten => 10,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            DrawType::Single => 1,
            DrawType::Ten => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DrawType::Single => "single",
            DrawType::Ten => "ten",
        }
    }
}

impl fmt::Display for DrawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(DrawType::Single),
            "ten" => Ok(DrawType::Ten),
            other => Err(AppError::InvalidInput(format!("Unknown drawType: {other}"))),
        }
    }
}

/// 抽卡日志（每抽出一个角色一行）
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub draw_type: DrawType,
    pub cost: i64,
    /// 本次抽卡中的位置，从 1 开始
    pub result_index: i64,
    pub char_id: String,
    pub audit_token: String,
    pub request_id: String,
}

impl DrawLogEntry {
    pub const COL_TIMESTAMP: usize = 0;
    pub const COL_USER_ID: usize = 1;
    pub const COL_DRAW_TYPE: usize = 2;
    pub const COL_COST: usize = 3;
    pub const COL_RESULT_INDEX: usize = 4;
    pub const COL_CHAR_ID: usize = 5;
    pub const COL_AUDIT_TOKEN: usize = 6;
    pub const COL_REQUEST_ID: usize = 7;

    pub fn to_row(&self) -> Row {
        vec![
            datetime_cell(&self.timestamp),
            json!(self.user_id),
            json!(self.draw_type.as_str()),
            json!(self.cost),
            json!(self.result_index),
            json!(self.char_id),
            json!(self.audit_token),
            json!(self.request_id),
        ]
    }

    pub fn from_row(row: &Row) -> AppResult<Self> {
        Ok(Self {
            timestamp: row_datetime(row, Self::COL_TIMESTAMP, "timestamp")?,
            user_id: row_string(row, Self::COL_USER_ID),
            draw_type: row_string(row, Self::COL_DRAW_TYPE)
                .parse::<DrawType>()
                .map_err(|e| AppError::StorageError(e.to_string()))?,
            cost: row_i64(row, Self::COL_COST, "cost")?,
            result_index: row_i64(row, Self::COL_RESULT_INDEX, "resultIndex")?,
            char_id: row_string(row, Self::COL_CHAR_ID),
            audit_token: row_string(row, Self::COL_AUDIT_TOKEN),
            request_id: row_string(row, Self::COL_REQUEST_ID),
        })
    }
}

/// 十连汇总（每次十连一行，resultCharIds 以逗号拼接）
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSummary {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub draw_type: DrawType,
    pub cost: i64,
    pub result_char_ids: Vec<String>,
}

impl DrawSummary {
    pub fn to_row(&self) -> Row {
        vec![
            datetime_cell(&self.timestamp),
            json!(self.user_id),
            json!(self.draw_type.as_str()),
            json!(self.cost),
            json!(self.result_char_ids.join(",")),
        ]
    }
}

/// draw 响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    /// 扣除后剩余票数
    pub tickets_after: i64,
    /// 按抽取顺序排列的结果
    pub results: Vec<Character>,
    pub draw_type: DrawType,
    /// 相同 requestId 的重复请求：返回首次结果，不再扣票
    pub replayed: bool,
}

/// 抽卡记录分页
pub type DrawHistoryPage = super::PaginatedResponse<DrawLogEntry>;
