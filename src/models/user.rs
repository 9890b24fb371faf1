use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::Character;
use crate::database::Row;
use crate::database::cell::{datetime_cell, row_datetime, row_i64, row_string};
use crate::error::{AppError, AppResult};

/// 用户表的一行: userId | tickets | createdAt | lastLoginAt
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub tickets: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl User {
    pub const COL_USER_ID: usize = 0;
    pub const COL_TICKETS: usize = 1;
    pub const COL_CREATED_AT: usize = 2;
    pub const COL_LAST_LOGIN_AT: usize = 3;

    pub fn new(user_id: &str, tickets: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            tickets,
            created_at: now,
            last_login_at: now,
        }
    }

    pub fn from_row(row: &Row) -> AppResult<Self> {
        let user_id = row_string(row, Self::COL_USER_ID);
        let tickets = row_i64(row, Self::COL_TICKETS, "tickets")?;
        if tickets < 0 {
            return Err(AppError::StorageError(format!(
                "user {user_id} has a negative ticket balance: {tickets}"
            )));
        }
        Ok(Self {
            tickets,
            created_at: row_datetime(row, Self::COL_CREATED_AT, "createdAt")?,
            last_login_at: row_datetime(row, Self::COL_LAST_LOGIN_AT, "lastLoginAt")?,
            user_id,
        })
    }

    pub fn to_row(&self) -> Row {
        vec![
            json!(self.user_id),
            json!(self.tickets),
            datetime_cell(&self.created_at),
            datetime_cell(&self.last_login_at),
        ]
    }

    /// 按 userId 线性扫描用户表（跳过表头），返回行号与解析后的用户
    pub fn find_in(rows: &[Row], user_id: &str) -> AppResult<Option<(usize, User)>> {
        rows.iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row_string(row, Self::COL_USER_ID) == user_id)
            .map(|(idx, row)| User::from_row(row).map(|user| (idx, user)))
            .transpose()
    }
}

/// initUser 响应
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitUserResponse {
    pub user_id: String,
    /// 当前票数
    pub tickets: i64,
    /// 可抽取的角色池
    pub character_pool: Vec<Character>,
}
