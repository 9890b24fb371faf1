use std::collections::HashMap;

use crate::database::{Table, TableStore, TableStoreBackend};
use crate::database::cell::row_string;
use crate::error::AppResult;
use crate::models::Character;

#[derive(Clone)]
pub struct CharacterService<S = TableStoreBackend> {
    store: S,
}

impl<S: TableStore> CharacterService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 读取启用的角色池（保持表中顺序）
    ///
    /// enabled 为布尔 true 或字符串 "true"（忽略大小写）才会入池；
    /// 权重无法解析或不为正数的行跳过并记录警告。池为空不算错误。
    pub async fn load_enabled_pool(&self) -> AppResult<Vec<Character>> {
        let rows = self.store.read_all(Table::Characters).await?;
        let mut pool = Vec::with_capacity(rows.len().saturating_sub(1));
        for row in rows.iter().skip(1) {
            if !Character::row_enabled(row) {
                continue;
            }
            match Character::from_row(row) {
                Ok(c) => pool.push(c),
                Err(e) => log::warn!("Skipping character row: {e}"),
            }
        }
        Ok(pool)
    }

    /// 全部角色（含未启用）按 charId 索引，用于回放历史结果
    pub async fn load_all_by_id(&self) -> AppResult<HashMap<String, Character>> {
        let rows = self.store.read_all(Table::Characters).await?;
        Ok(rows
            .iter()
            .skip(1)
            .filter_map(|row| match Character::from_row(row) {
                Ok(c) => Some((c.char_id.clone(), c)),
                Err(e) => {
                    log::warn!(
                        "Character {} unreadable: {e}",
                        row_string(row, Character::COL_CHAR_ID)
                    );
                    None
                }
            })
            .collect())
    }
}
