use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::Row;
use crate::database::cell::{cell_is_true, cell_to_f64, row_string};
use crate::error::{AppError, AppResult};
use crate::utils::Weighted;

/// 稀有度标签；未知标签原样保留
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    N,
    R,
    SR,
    SSR,
    UR,
    Other(String),
}

impl Rarity {
    pub fn as_str(&self) -> &str {
        match self {
            Rarity::N => "N",
            Rarity::R => "R",
            Rarity::SR => "SR",
            Rarity::SSR => "SSR",
            Rarity::UR => "UR",
            Rarity::Other(label) => label,
        }
    }
}

impl From<String> for Rarity {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "N" => Rarity::N,
            "R" => Rarity::R,
            "SR" => Rarity::SR,
            "SSR" => Rarity::SSR,
            "UR" => Rarity::UR,
            _ => Rarity::Other(label),
        }
    }
}

impl From<Rarity> for String {
    fn from(rarity: Rarity) -> Self {
        rarity.as_str().to_string()
    }
}

/// 角色池中的一项（角色表: charId | name | rarity | weight | imageUrl | enabled）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub char_id: String,
    pub name: String,
    #[schema(value_type = String, example = "SSR")]
    pub rarity: Rarity,
    /// 抽取权重 (> 0)
    pub weight: f64,
    pub image_url: String,
}

impl Character {
    pub const COL_CHAR_ID: usize = 0;
    pub const COL_NAME: usize = 1;
    pub const COL_RARITY: usize = 2;
    pub const COL_WEIGHT: usize = 3;
    pub const COL_IMAGE_URL: usize = 4;
    pub const COL_ENABLED: usize = 5;

    pub fn from_row(row: &Row) -> AppResult<Self> {
        let char_id = row_string(row, Self::COL_CHAR_ID);
        let weight = row
            .get(Self::COL_WEIGHT)
            .and_then(cell_to_f64)
            .filter(|w| *w > 0.0)
            .ok_or_else(|| {
                AppError::StorageError(format!(
                    "character {char_id} has an invalid weight: {:?}",
                    row.get(Self::COL_WEIGHT)
                ))
            })?;
        Ok(Self {
            name: row_string(row, Self::COL_NAME),
            rarity: Rarity::from(row_string(row, Self::COL_RARITY)),
            weight,
            image_url: row_string(row, Self::COL_IMAGE_URL),
            char_id,
        })
    }

    pub fn row_enabled(row: &Row) -> bool {
        row.get(Self::COL_ENABLED).is_some_and(cell_is_true)
    }

    /// 角色表中已找不到时的占位记录（仅保留 id）
    pub fn placeholder(char_id: &str) -> Self {
        Self {
            char_id: char_id.to_string(),
            name: String::new(),
            rarity: Rarity::Other(String::new()),
            weight: 0.0,
            image_url: String::new(),
        }
    }
}

impl Weighted for Character {
    fn weight(&self) -> f64 {
        self.weight
    }
}
