use chrono::Utc;

use super::{CharacterService, TransactionLock};
use crate::database::cell::row_string;
use crate::database::{Row, Table, TableStore, TableStoreBackend};
use crate::error::{AppError, AppResult};
use crate::models::{
    Character, DrawHistoryPage, DrawLogEntry, DrawResponse, DrawSummary, DrawType,
    PaginatedResponse, PaginationParams, User,
};
use crate::utils::{generate_audit_token, pick_one};

#[derive(Clone)]
pub struct DrawService<S = TableStoreBackend> {
    store: S,
    lock: TransactionLock,
    characters: CharacterService<S>,
}

impl<S: TableStore + Clone> DrawService<S> {
    pub fn new(store: S, lock: TransactionLock) -> Self {
        Self {
            characters: CharacterService::new(store.clone()),
            store,
            lock,
        }
    }

    /// 抽卡
    ///
    /// 逻辑:
    /// 1. 校验 drawType (single -> 1 票 1 次, ten -> 10 票 10 次)
    /// 2. 加全局锁后扫描用户表，用户不存在返回 NotFound
    /// 3. requestId 已有记录则直接回放，不重复扣票；drawType 不一致返回 InvalidInput
    /// 4. 票数不足返回 InsufficientFunds，不做部分抽取
    /// 5. 从启用角色池按权重独立抽取 count 次（可重复）
    /// 6. 写回余额，逐个追加日志，十连额外追加一行汇总
    ///
    /// 余额写入后若追加日志失败，扣除的票不会回滚。
    pub async fn draw(
        &self,
        user_id: &str,
        draw_type: &str,
        request_id: Option<&str>,
    ) -> AppResult<DrawResponse> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("userId is required".into()));
        }
        let draw_type: DrawType = draw_type.parse()?;
        let request_id = request_id.map(str::trim).unwrap_or_default();

        let _guard = self.lock.acquire().await?;

        let users = self.store.read_all(Table::Users).await?;
        let (user_row, user) = User::find_in(&users, user_id)?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        if !request_id.is_empty()
            && let Some(replay) = self.replay(&user, request_id).await?
        {
            if replay.draw_type != draw_type {
                return Err(AppError::InvalidInput(format!(
                    "requestId {request_id} was already used for a {} draw",
                    replay.draw_type
                )));
            }
            log::info!("Replaying draw {request_id} for user {user_id}");
            return Ok(replay);
        }

        let cost = draw_type.cost();
        if user.tickets < cost {
            return Err(AppError::InsufficientFunds {
                required: cost,
                available: user.tickets,
            });
        }

        let pool = self.characters.load_enabled_pool().await?;
        let results: Vec<Character> = {
            let mut rng = rand::thread_rng();
            (0..draw_type.count())
                .map(|_| pick_one(&pool, &mut rng).cloned())
                .collect::<Option<_>>()
                .ok_or(AppError::NoCharactersAvailable)?
        };

        let tickets_after = user.tickets - cost;
        self.store
            .write_cell(
                Table::Users,
                user_row,
                User::COL_TICKETS,
                serde_json::json!(tickets_after),
            )
            .await?;

        let now = Utc::now();
        let log_rows: Vec<Row> = results
            .iter()
            .zip(1..)
            .map(|(c, idx)| {
                DrawLogEntry {
                    timestamp: now,
                    user_id: user_id.to_string(),
                    draw_type,
                    cost,
                    result_index: idx,
                    char_id: c.char_id.clone(),
                    audit_token: generate_audit_token(),
                    request_id: request_id.to_string(),
                }
                .to_row()
            })
            .collect();
        self.store.append_rows(Table::Logs, log_rows).await?;

        if draw_type == DrawType::Ten {
            let summary = DrawSummary {
                timestamp: now,
                user_id: user_id.to_string(),
                draw_type,
                cost,
                result_char_ids: results.iter().map(|c| c.char_id.clone()).collect(),
            };
            self.store.append_row(Table::Summary, summary.to_row()).await?;
        }

        log::info!(
            "User {user_id} drew {draw_type} ({} results), tickets {} -> {tickets_after}",
            results.len(),
            user.tickets
        );

        Ok(DrawResponse {
            tickets_after,
            results,
            draw_type,
            replayed: false,
        })
    }

    /// 分页获取用户抽卡日志（倒序）。只读，不加锁。
    pub async fn history(
        &self,
        user_id: &str,
        params: &PaginationParams,
    ) -> AppResult<DrawHistoryPage> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("userId is required".into()));
        }

        let rows = self.store.read_all(Table::Logs).await?;
        let entries = Self::entries_for(&rows, user_id, |_| true)?;
        let total = entries.len() as u64;
        let items = entries
            .into_iter()
            .rev()
            .skip(params.get_offset())
            .take(params.get_limit())
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 同一用户、同一 requestId 已有日志时，按 resultIndex 重建首次结果
    async fn replay(&self, user: &User, request_id: &str) -> AppResult<Option<DrawResponse>> {
        let rows = self.store.read_all(Table::Logs).await?;
        let mut entries = Self::entries_for(&rows, &user.user_id, |row| {
            row_string(row, DrawLogEntry::COL_REQUEST_ID) == request_id
        })?;
        if entries.is_empty() {
            return Ok(None);
        }
        entries.sort_by_key(|e| e.result_index);

        let characters = self.characters.load_all_by_id().await?;
        let results = entries
            .iter()
            .map(|e| {
                characters
                    .get(&e.char_id)
                    .cloned()
                    .unwrap_or_else(|| Character::placeholder(&e.char_id))
            })
            .collect();

        Ok(Some(DrawResponse {
            tickets_after: user.tickets,
            results,
            draw_type: entries[0].draw_type,
            replayed: true,
        }))
    }

    fn entries_for(
        rows: &[Row],
        user_id: &str,
        filter: impl Fn(&Row) -> bool,
    ) -> AppResult<Vec<DrawLogEntry>> {
        rows.iter()
            .skip(1)
            .filter(|row| row_string(row, DrawLogEntry::COL_USER_ID) == user_id && filter(*row))
            .map(DrawLogEntry::from_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::cell::datetime_cell;
    use crate::database::{Cell, MemoryTableStore, ensure_tables};
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    async fn setup(tickets: i64) -> (MemoryTableStore, DrawService<MemoryTableStore>) {
        let store = MemoryTableStore::new();
        ensure_tables(&store, &[]).await.unwrap();
        store
            .append_rows(
                Table::Characters,
                vec![
                    vec![json!("c1"), json!("Aoi"), json!("SSR"), json!(3), json!(""), json!(true)],
                    vec![json!("c2"), json!("Ren"), json!("R"), json!(60), json!(""), json!("TRUE")],
                    vec![json!("c3"), json!("Kai"), json!("SR"), json!(37), json!(""), json!(true)],
                    vec![json!("c4"), json!("Off"), json!("UR"), json!(1000), json!(""), json!(false)],
                ],
            )
            .await
            .unwrap();
        let now = Utc::now();
        store
            .append_row(Table::Users, User::new("alice", tickets, now).to_row())
            .await
            .unwrap();
        let service = DrawService::new(
            store.clone(),
            TransactionLock::new(Duration::from_millis(200)),
        );
        (store, service)
    }

    async fn tickets_of(store: &MemoryTableStore, user_id: &str) -> i64 {
        let rows = store.read_all(Table::Users).await.unwrap();
        User::find_in(&rows, user_id).unwrap().unwrap().1.tickets
    }

    async fn data_rows(store: &MemoryTableStore, table: Table) -> Vec<Row> {
        store.read_all(table).await.unwrap().into_iter().skip(1).collect()
    }

    #[tokio::test]
    async fn test_single_draw() {
        let (store, service) = setup(10).await;
        let res = service.draw("alice", "single", None).await.unwrap();

        assert_eq!(res.tickets_after, 9);
        assert_eq!(res.results.len(), 1);
        assert_eq!(res.draw_type, DrawType::Single);
        assert!(!res.replayed);
        assert_eq!(tickets_of(&store, "alice").await, 9);

        let logs = data_rows(&store, Table::Logs).await;
        assert_eq!(logs.len(), 1);
        let entry = DrawLogEntry::from_row(&logs[0]).unwrap();
        assert_eq!(entry.result_index, 1);
        assert_eq!(entry.cost, 1);
        assert_eq!(entry.char_id, res.results[0].char_id);
        assert!(data_rows(&store, Table::Summary).await.is_empty());
    }

    #[tokio::test]
    async fn test_ten_draw_logs_and_summary() {
        let (store, service) = setup(25).await;
        let res = service.draw("alice", "ten", Some("req-1")).await.unwrap();

        assert_eq!(res.tickets_after, 15);
        assert_eq!(res.results.len(), 10);
        assert_eq!(tickets_of(&store, "alice").await, 15);

        let enabled: HashSet<&str> = ["c1", "c2", "c3"].into_iter().collect();
        assert!(res.results.iter().all(|c| enabled.contains(c.char_id.as_str())));

        let logs: Vec<DrawLogEntry> = data_rows(&store, Table::Logs)
            .await
            .iter()
            .map(|r| DrawLogEntry::from_row(r).unwrap())
            .collect();
        assert_eq!(logs.len(), 10);
        for (i, (entry, c)) in logs.iter().zip(&res.results).enumerate() {
            assert_eq!(entry.result_index, i as i64 + 1);
            assert_eq!(entry.char_id, c.char_id);
            assert_eq!(entry.request_id, "req-1");
            assert_eq!(entry.draw_type, DrawType::Ten);
        }
        let tokens: HashSet<&str> = logs.iter().map(|e| e.audit_token.as_str()).collect();
        assert_eq!(tokens.len(), 10);

        let summary = data_rows(&store, Table::Summary).await;
        assert_eq!(summary.len(), 1);
        let expected: Vec<&str> = res.results.iter().map(|c| c.char_id.as_str()).collect();
        assert_eq!(summary[0][4], json!(expected.join(",")));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance() {
        let (store, service) = setup(5).await;
        let err = service.draw("alice", "ten", None).await;
        assert!(matches!(
            err,
            Err(AppError::InsufficientFunds {
                required: 10,
                available: 5
            })
        ));
        assert_eq!(tickets_of(&store, "alice").await, 5);
        assert!(data_rows(&store, Table::Logs).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_balance_reaches_zero() {
        let (store, service) = setup(10).await;
        let res = service.draw("alice", "ten", None).await.unwrap();
        assert_eq!(res.tickets_after, 0);
        assert!(matches!(
            service.draw("alice", "single", None).await,
            Err(AppError::InsufficientFunds { .. })
        ));
        assert_eq!(tickets_of(&store, "alice").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_and_bad_input() {
        let (_store, service) = setup(10).await;
        assert!(matches!(
            service.draw("bob", "single", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.draw("alice", "hundred", None).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service.draw("", "single", None).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_pool_writes_nothing() {
        let store = MemoryTableStore::new();
        ensure_tables(&store, &[]).await.unwrap();
        store
            .append_row(
                Table::Characters,
                vec![json!("c1"), json!("Off"), json!("R"), json!(1), json!(""), json!(false)],
            )
            .await
            .unwrap();
        store
            .append_row(Table::Users, User::new("alice", 10, Utc::now()).to_row())
            .await
            .unwrap();
        let service = DrawService::new(
            store.clone(),
            TransactionLock::new(Duration::from_millis(200)),
        );

        assert!(matches!(
            service.draw("alice", "single", None).await,
            Err(AppError::NoCharactersAvailable)
        ));
        assert_eq!(tickets_of(&store, "alice").await, 10);
        assert!(data_rows(&store, Table::Logs).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_request_id_replays() {
        let (store, service) = setup(30).await;
        let first = service.draw("alice", "ten", Some("req-42")).await.unwrap();
        let second = service.draw("alice", "ten", Some("req-42")).await.unwrap();

        assert!(second.replayed);
        assert_eq!(second.tickets_after, 20);
        assert_eq!(second.draw_type, DrawType::Ten);
        assert_eq!(second.results, first.results);
        assert_eq!(tickets_of(&store, "alice").await, 20);
        assert_eq!(data_rows(&store, Table::Logs).await.len(), 10);
        assert_eq!(data_rows(&store, Table::Summary).await.len(), 1);

        // 不同 requestId / 空 requestId 正常扣票
        service.draw("alice", "single", Some("req-43")).await.unwrap();
        service.draw("alice", "single", Some("")).await.unwrap();
        service.draw("alice", "single", Some("")).await.unwrap();
        assert_eq!(tickets_of(&store, "alice").await, 17);
    }

    #[tokio::test]
    async fn test_reused_request_id_with_other_draw_type_is_rejected() {
        let (store, service) = setup(30).await;
        service.draw("alice", "ten", Some("req-7")).await.unwrap();

        assert!(matches!(
            service.draw("alice", "single", Some("req-7")).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(tickets_of(&store, "alice").await, 20);
        assert_eq!(data_rows(&store, Table::Logs).await.len(), 10);
    }

    #[tokio::test]
    async fn test_request_id_is_scoped_per_user() {
        let (store, service) = setup(10).await;
        store
            .append_row(Table::Users, User::new("bob", 10, Utc::now()).to_row())
            .await
            .unwrap();
        service.draw("alice", "single", Some("same")).await.unwrap();
        let bob = service.draw("bob", "single", Some("same")).await.unwrap();
        assert!(!bob.replayed);
        assert_eq!(bob.tickets_after, 9);
    }

    #[tokio::test]
    async fn test_replay_of_removed_character_uses_placeholder() {
        let (store, service) = setup(10).await;
        store
            .append_row(
                Table::Logs,
                vec![
                    datetime_cell(&Utc::now()),
                    json!("alice"),
                    json!("single"),
                    json!(1),
                    json!(1),
                    json!("gone"),
                    json!("tok"),
                    json!("old-req"),
                ],
            )
            .await
            .unwrap();
        let res = service.draw("alice", "single", Some("old-req")).await.unwrap();
        assert!(res.replayed);
        assert_eq!(res.results, vec![Character::placeholder("gone")]);
        assert_eq!(res.tickets_after, 10);
    }

    #[tokio::test]
    async fn test_draw_times_out_when_lock_held() {
        let (store, service) = setup(10).await;
        let _held = service.lock.acquire().await.unwrap();
        assert!(matches!(
            service.draw("alice", "single", None).await,
            Err(AppError::LockTimeout(_))
        ));
        assert_eq!(tickets_of(&store, "alice").await, 10);
    }

    /// 每次读写前让出执行权，使并发任务在临界区内交错
    #[derive(Clone)]
    struct YieldingStore(MemoryTableStore);

    impl TableStore for YieldingStore {
        async fn read_all(&self, table: Table) -> AppResult<Vec<Row>> {
            tokio::task::yield_now().await;
            self.0.read_all(table).await
        }

        async fn write_cell(
            &self,
            table: Table,
            row: usize,
            col: usize,
            value: Cell,
        ) -> AppResult<()> {
            tokio::task::yield_now().await;
            self.0.write_cell(table, row, col, value).await
        }

        async fn append_row(&self, table: Table, values: Row) -> AppResult<()> {
            tokio::task::yield_now().await;
            self.0.append_row(table, values).await
        }

        async fn append_rows(&self, table: Table, rows: Vec<Row>) -> AppResult<()> {
            tokio::task::yield_now().await;
            self.0.append_rows(table, rows).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_draws_never_overspend() {
        let (store, _) = setup(5).await;
        let service = DrawService::new(
            YieldingStore(store.clone()),
            TransactionLock::new(Duration::from_secs(5)),
        );
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = service.clone();
                async move { svc.draw("alice", "single", None).await }
            })
            .collect();
        let outcomes = run_concurrently(handles).await;

        let ok = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 5);
        assert!(outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::InsufficientFunds { .. })));
        assert_eq!(tickets_of(&store, "alice").await, 0);
        assert_eq!(data_rows(&store, Table::Logs).await.len(), 5);
    }

    // 在同一线程上并发执行，靠全局锁串行化
    async fn run_concurrently<F>(futs: Vec<F>) -> Vec<F::Output>
    where
        F: std::future::Future + 'static,
        F::Output: 'static,
    {
        let set = tokio::task::LocalSet::new();
        set.run_until(async move {
            let handles: Vec<_> = futs.into_iter().map(tokio::task::spawn_local).collect();
            let mut out = Vec::with_capacity(handles.len());
            for h in handles {
                out.push(h.await.unwrap());
            }
            out
        })
        .await
    }

    #[tokio::test]
    async fn test_history_newest_first_and_paginated() {
        let (_store, service) = setup(30).await;
        service.draw("alice", "ten", Some("r1")).await.unwrap();
        service.draw("alice", "single", Some("r2")).await.unwrap();

        let page = service
            .history("alice", &PaginationParams::new(Some(1), Some(4)))
            .await
            .unwrap();
        assert_eq!(page.total, 11);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].request_id, "r2");
        assert_eq!(page.items[1].result_index, 10);

        let last = service
            .history("alice", &PaginationParams::new(Some(3), Some(4)))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 3);
        assert_eq!(last.items[2].result_index, 1);

        let other = service
            .history("nobody", &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(other.total, 0);
        assert!(other.items.is_empty());

        let beyond = service
            .history("alice", &PaginationParams::new(Some(u32::MAX), Some(100)))
            .await
            .unwrap();
        assert_eq!(beyond.total, 11);
        assert!(beyond.items.is_empty());
    }
}
