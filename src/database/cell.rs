//! 表格单元格的宽松类型转换
//!
//! 表格里的值可能是字符串、数字或布尔（例如 enabled 既可能是 `true` 也可能是 `"TRUE"`），
//! 读出后立即在这里统一转换成强类型字段。

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub type Cell = Value;
pub type Row = Vec<Cell>;

/// 单元格转字符串（数字按表格习惯输出，整数值不带小数点）
pub fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64()
                && f.fract() == 0.0
                && f.abs() < 1e15
            {
                format!("{}", f as i64)
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

pub fn row_string(row: &Row, col: usize) -> String {
    row.get(col).map(cell_to_string).unwrap_or_default()
}

pub fn cell_to_i64(cell: &Cell) -> Option<i64> {
    match cell {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn cell_to_f64(cell: &Cell) -> Option<f64> {
    let value: Option<f64> = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|f| f.is_finite())
}

/// 布尔 true 或字符串（忽略大小写）"true" 视为真，其余一律为假
pub fn cell_is_true(cell: &Cell) -> bool {
    match cell {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub fn cell_to_datetime(cell: &Cell) -> Option<DateTime<Utc>> {
    match cell {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

pub fn datetime_cell(dt: &DateTime<Utc>) -> Cell {
    Value::String(dt.to_rfc3339())
}

pub fn row_i64(row: &Row, col: usize, what: &str) -> AppResult<i64> {
    row.get(col)
        .and_then(cell_to_i64)
        .ok_or_else(|| {
            AppError::StorageError(format!("{what} is not an integer: {:?}", row.get(col)))
        })
}

pub fn row_datetime(row: &Row, col: usize, what: &str) -> AppResult<DateTime<Utc>> {
    row.get(col)
        .and_then(cell_to_datetime)
        .ok_or_else(|| {
            AppError::StorageError(format!("{what} is not a timestamp: {:?}", row.get(col)))
        })
}
