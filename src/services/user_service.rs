use chrono::Utc;

use super::{CharacterService, TransactionLock};
use crate::database::cell::datetime_cell;
use crate::database::{Table, TableStore, TableStoreBackend};
use crate::error::{AppError, AppResult};
use crate::models::{InitUserResponse, User};

#[derive(Clone)]
pub struct UserService<S = TableStoreBackend> {
    store: S,
    lock: TransactionLock,
    characters: CharacterService<S>,
    starting_tickets: i64,
}

impl<S: TableStore + Clone> UserService<S> {
    pub fn new(store: S, lock: TransactionLock, starting_tickets: i64) -> Self {
        Self {
            characters: CharacterService::new(store.clone()),
            store,
            lock,
            starting_tickets,
        }
    }

    /// 初始化或登录
    ///
    /// 已存在: 只更新 lastLoginAt，票数不变；不存在: 追加新用户并发放初始票数。
    /// 两种情况都返回当前票数与启用的角色池。
    pub async fn init_or_login(&self, user_id: &str) -> AppResult<InitUserResponse> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("userId is required".into()));
        }

        let _guard = self.lock.acquire().await?;
        let now = Utc::now();

        let rows = self.store.read_all(Table::Users).await?;
        let tickets = match User::find_in(&rows, user_id)? {
            Some((row, user)) => {
                self.store
                    .write_cell(Table::Users, row, User::COL_LAST_LOGIN_AT, datetime_cell(&now))
                    .await?;
                log::debug!("User {user_id} logged in");
                user.tickets
            }
            None => {
                let user = User::new(user_id, self.starting_tickets, now);
                self.store.append_row(Table::Users, user.to_row()).await?;
                log::info!(
                    "Created user {user_id} with {} starting tickets",
                    self.starting_tickets
                );
                user.tickets
            }
        };

        let character_pool = self.characters.load_enabled_pool().await?;

        Ok(InitUserResponse {
            user_id: user_id.to_string(),
            tickets,
            character_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryTableStore, ensure_tables};
    use serde_json::json;
    use std::time::Duration;

    async fn setup() -> (MemoryTableStore, UserService<MemoryTableStore>) {
        let store = MemoryTableStore::new();
        ensure_tables(&store, &[]).await.unwrap();
        store
            .append_rows(
                Table::Characters,
                vec![
                    vec![json!("c1"), json!("Aoi"), json!("SSR"), json!(3), json!(""), json!(true)],
                    vec![json!("c2"), json!("Ren"), json!("R"), json!(97), json!(""), json!(false)],
                ],
            )
            .await
            .unwrap();
        let service = UserService::new(
            store.clone(),
            TransactionLock::new(Duration::from_millis(200)),
            10,
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_new_user_gets_starting_grant_and_pool() {
        let (store, service) = setup().await;
        let res = service.init_or_login("alice").await.unwrap();
        assert_eq!(res.user_id, "alice");
        assert_eq!(res.tickets, 10);
        assert_eq!(res.character_pool.len(), 1);
        assert_eq!(res.character_pool[0].char_id, "c1");

        let rows = store.read_all(Table::Users).await.unwrap();
        assert_eq!(rows.len(), 2);
        let user = User::from_row(&rows[1]).unwrap();
        assert_eq!(user.created_at, user.last_login_at);
    }

    #[tokio::test]
    async fn test_second_login_only_touches_last_login() {
        let (store, service) = setup().await;
        service.init_or_login("alice").await.unwrap();
        // 模拟抽卡后的余额
        store
            .write_cell(Table::Users, 1, User::COL_TICKETS, json!(4))
            .await
            .unwrap();
        let before = User::from_row(&store.read_all(Table::Users).await.unwrap()[1]).unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let res = service.init_or_login("alice").await.unwrap();
        assert_eq!(res.tickets, 4);

        let rows = store.read_all(Table::Users).await.unwrap();
        assert_eq!(rows.len(), 2);
        let after = User::from_row(&rows[1]).unwrap();
        assert_eq!(after.tickets, before.tickets);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_login_at > before.last_login_at);
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected() {
        let (store, service) = setup().await;
        for id in ["", "   "] {
            assert!(matches!(
                service.init_or_login(id).await,
                Err(AppError::InvalidInput(_))
            ));
        }
        assert_eq!(store.read_all(Table::Users).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_init_waits_for_lock() {
        let (_store, service) = setup().await;
        let _held = service.lock.acquire().await.unwrap();
        assert!(matches!(
            service.init_or_login("alice").await,
            Err(AppError::LockTimeout(_))
        ));
    }
}
