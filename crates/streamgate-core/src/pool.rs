//! Worker pool: authenticated backend sessions with round-robin selection
//!
//! The pool is populated once at startup by [`WorkerPool::bring_up`], which
//! authenticates every configured credential concurrently. Workers are never
//! evicted afterwards; a failed bring-up attempt is logged and skipped so the
//! gateway can start degraded, even with an empty pool.

use crate::{CoreError, Result};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use streamgate_relay::{AccountInfo, RelayConnector, RelaySession};
use tracing::{debug, error, info};

/// Per-attempt bound on backend authentication during bring-up.
pub const BRING_UP_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifier assigned to a worker at bring-up, monotonically increasing.
pub type WorkerId = usize;

/// One authenticated backend connection used to relay files.
pub struct Worker {
    pub id: WorkerId,
    pub session: Arc<dyn RelaySession>,
    pub account: AccountInfo,
}

impl std::fmt::Display for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{worker ({}|@{})}}", self.id, self.account.username)
    }
}

struct PoolInner {
    workers: Vec<Arc<Worker>>,
    cursor: usize,
    /// Bring-up counter, source of worker ids
    started: usize,
}

/// Ordered set of workers with a shared round-robin cursor.
pub struct WorkerPool {
    inner: Mutex<PoolInner>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                workers: Vec::new(),
                cursor: 0,
                started: 0,
            }),
        }
    }

    /// Append a worker with the next bring-up id. Does not move the
    /// round-robin cursor.
    pub fn add_worker(&self, session: Arc<dyn RelaySession>) -> WorkerId {
        let account = session.account().clone();
        let mut inner = self.inner.lock();
        inner.started += 1;
        let id = inner.started;
        info!(worker_id = id, username = %account.username, "worker joined pool");
        inner.workers.push(Arc::new(Worker { id, session, account }));
        id
    }

    pub fn len(&self) -> usize {
        self.inner.lock().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().workers.is_empty()
    }

    /// Current worker list. The scheduler re-reads this on every
    /// acquisition so workers added later are visible to it.
    pub fn workers(&self) -> Vec<Arc<Worker>> {
        self.inner.lock().workers.clone()
    }

    /// Advance the shared cursor by one position modulo pool size and return
    /// that worker. The lock serializes cursor advancement, so sequential
    /// calls from any number of concurrent callers observe strict
    /// round-robin order.
    pub fn select_next(&self) -> Result<Arc<Worker>> {
        let mut inner = self.inner.lock();
        if inner.workers.is_empty() {
            return Err(CoreError::NoWorkers);
        }
        inner.cursor = (inner.cursor + 1) % inner.workers.len();
        let worker = Arc::clone(&inner.workers[inner.cursor]);
        debug!(worker_id = worker.id, "using worker");
        Ok(worker)
    }

    /// Authenticate every credential concurrently, each attempt bounded by
    /// [`BRING_UP_TIMEOUT`]. Failures are logged and skipped; the call
    /// returns once all attempts have finished, with the count of successes
    /// out of the total attempted. Zero successes is a valid degraded
    /// outcome.
    pub async fn bring_up(
        &self,
        connector: Arc<dyn RelayConnector>,
        credentials: &[String],
    ) -> (usize, usize) {
        let total = credentials.len();
        if total == 0 {
            info!("no worker credentials provided, skipping worker bring-up");
            return (0, 0);
        }

        let attempts = credentials.iter().cloned().enumerate().map(|(index, credential)| {
            let connector = Arc::clone(&connector);
            tokio::spawn(async move {
                match tokio::time::timeout(BRING_UP_TIMEOUT, connector.connect(&credential)).await {
                    Ok(Ok(session)) => Some(session),
                    Ok(Err(e)) => {
                        error!(index, error = %e, "failed to start worker");
                        None
                    }
                    Err(_) => {
                        error!(index, "timed out starting worker");
                        None
                    }
                }
            })
        });

        let mut succeeded = 0;
        for result in join_all(attempts).await {
            if let Ok(Some(session)) = result {
                self.add_worker(Arc::from(session));
                succeeded += 1;
            }
        }
        info!(succeeded, total, "worker bring-up finished");
        (succeeded, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgate_relay::MemoryConnector;

    async fn pool_with_workers(n: usize) -> Arc<WorkerPool> {
        let pool = Arc::new(WorkerPool::new());
        let connector = Arc::new(MemoryConnector::new());
        let credentials: Vec<String> = (0..n).map(|i| format!("token-{i}")).collect();
        let (ok, total) = pool.bring_up(connector, &credentials).await;
        assert_eq!((ok, total), (n, n));
        pool
    }

    #[tokio::test]
    async fn test_bring_up_assigns_monotonic_ids() {
        let pool = pool_with_workers(3).await;
        let mut ids: Vec<WorkerId> = pool.workers().iter().map(|w| w.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_bring_up_skips_failed_credentials() {
        let pool = Arc::new(WorkerPool::new());
        let connector = Arc::new(MemoryConnector::new());
        // The memory connector rejects empty credentials.
        let credentials = vec!["good".to_string(), String::new(), "also-good".to_string()];
        let (ok, total) = pool.bring_up(connector, &credentials).await;
        assert_eq!(ok, 2);
        assert_eq!(total, 3);
        assert_eq!(pool.len(), 2);
    }

    #[tokio::test]
    async fn test_bring_up_with_no_credentials_is_degraded_not_fatal() {
        let pool = Arc::new(WorkerPool::new());
        let connector = Arc::new(MemoryConnector::new());
        let (ok, total) = pool.bring_up(connector, &[]).await;
        assert_eq!((ok, total), (0, 0));
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_select_next_errors_on_empty_pool() {
        let pool = WorkerPool::new();
        assert!(matches!(pool.select_next(), Err(CoreError::NoWorkers)));
    }

    #[tokio::test]
    async fn test_round_robin_covers_each_worker_once_per_cycle() {
        let pool = pool_with_workers(4).await;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(pool.select_next().unwrap().id);
        }
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4, "each worker selected exactly once: {seen:?}");

        // The next cycle repeats the same order.
        let mut second = Vec::new();
        for _ in 0..4 {
            second.push(pool.select_next().unwrap().id);
        }
        assert_eq!(seen, second);
    }

    #[tokio::test]
    async fn test_concurrent_selection_stays_balanced() {
        let pool = pool_with_workers(3).await;
        let mut handles = Vec::new();
        for _ in 0..30 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move { pool.select_next().unwrap().id }));
        }
        let mut counts = std::collections::HashMap::new();
        for h in handles {
            *counts.entry(h.await.unwrap()).or_insert(0usize) += 1;
        }
        // 30 selections over 3 workers: exactly 10 each.
        assert!(counts.values().all(|&c| c == 10), "{counts:?}");
    }
}
