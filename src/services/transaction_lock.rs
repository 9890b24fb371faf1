use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};

/// 进程级事务锁
///
/// 表格存储没有行级锁和多行事务，所有写操作（initUser / draw）必须串行执行：
/// 读之前加锁，全部写完后释放。等待超过上限返回 `LockTimeout`，不会无限阻塞。
#[derive(Clone)]
pub struct TransactionLock {
    inner: Arc<Mutex<()>>,
    timeout: Duration,
}

/// 持有期间独占全局事务；drop 即释放（包括出错提前返回的路径）
pub struct TransactionGuard {
    _guard: OwnedMutexGuard<()>,
}

impl TransactionLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
            timeout,
        }
    }

    pub async fn acquire(&self) -> AppResult<TransactionGuard> {
        match tokio::time::timeout(self.timeout, self.inner.clone().lock_owned()).await {
            Ok(guard) => Ok(TransactionGuard { _guard: guard }),
            Err(_) => Err(AppError::LockTimeout(self.timeout.as_millis() as u64)),
        }
    }
}
