use serde_json::json;

use super::table_store::{Table, TableStore};
use crate::config::CharacterSeed;
use crate::error::AppResult;

/// 为空表写入表头；角色表没有数据行时写入配置中的初始角色
pub async fn ensure_tables<S: TableStore>(store: &S, seeds: &[CharacterSeed]) -> AppResult<()> {
    for table in Table::ALL {
        if store.read_all(table).await?.is_empty() {
            log::info!("Initializing header row for sheet {}", table.sheet_name());
            store.append_row(table, table.header_row()).await?;
        }
    }

    let characters = store.read_all(Table::Characters).await?;
    if characters.len() <= 1 && !seeds.is_empty() {
        let rows = seeds
            .iter()
            .map(|c| {
                vec![
                    json!(c.char_id),
                    json!(c.name),
                    json!(c.rarity),
                    json!(c.weight),
                    json!(c.image_url),
                    json!(c.enabled),
                ]
            })
            .collect();
        store.append_rows(Table::Characters, rows).await?;
        log::info!("Seeded {} characters", seeds.len());
    }

    Ok(())
}
