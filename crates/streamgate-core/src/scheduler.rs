//! Cooldown-aware upload scheduling
//!
//! Spreads upload traffic across the pool so that no single worker receives
//! two uploads within the cooldown window unless every worker is inside its
//! cooldown. Cooldown is a soft fairness hint, not a hard admission gate: as
//! long as the pool is non-empty the scheduler always returns a worker,
//! possibly forcing one that is still cooling.

use crate::pool::{Worker, WorkerId, WorkerPool};
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

struct SchedState {
    last_used: HashMap<WorkerId, Instant>,
    /// Round-robin cursor, independent of the pool's own cursor
    cursor: usize,
}

/// Selects upload workers, keeping each below the per-worker cooldown.
///
/// Holds a live reference to the pool and re-reads the worker list on every
/// acquisition, so workers added after construction participate.
pub struct UploadScheduler {
    pool: Arc<WorkerPool>,
    cooldown: Duration,
    state: Mutex<SchedState>,
}

/// Point-in-time view of scheduler occupancy, surfaced by the metrics
/// endpoint.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerStats {
    pub total_workers: usize,
    pub available_workers: usize,
    pub cooling_workers: usize,
    pub cooldown: Duration,
}

impl UploadScheduler {
    pub fn new(pool: Arc<WorkerPool>, cooldown: Duration) -> Self {
        Self {
            pool,
            cooldown,
            state: Mutex::new(SchedState {
                last_used: HashMap::new(),
                cursor: 0,
            }),
        }
    }

    /// Pick a worker for an upload and stamp it as used now.
    pub fn acquire(&self) -> Result<Arc<Worker>> {
        self.acquire_at(Instant::now())
    }

    /// Scheduling decision against an explicit clock reading. The whole
    /// decision runs under one lock, so concurrent callers never observe a
    /// torn cursor or last-used map.
    pub fn acquire_at(&self, now: Instant) -> Result<Arc<Worker>> {
        if self.cooldown.is_zero() {
            // Cooldown disabled: plain round-robin over the pool.
            return self.pool.select_next();
        }

        let workers = self.pool.workers();
        if workers.is_empty() {
            return self.pool.select_next();
        }
        let count = workers.len();

        let mut state = self.state.lock();

        // Scan from the cursor, wrapping once, for a worker past its
        // cooldown (or never used).
        for offset in 0..count {
            let index = (state.cursor + offset) % count;
            let worker = &workers[index];
            let ready = match state.last_used.get(&worker.id) {
                None => true,
                Some(&used) => now.saturating_duration_since(used) > self.cooldown,
            };
            if ready {
                state.cursor = index;
                state.last_used.insert(worker.id, now);
                debug!(worker_id = worker.id, username = %worker.account.username, "selected upload worker");
                return Ok(Arc::clone(worker));
            }
        }

        // All workers cooling: take the one with the smallest remaining
        // wait, ties broken by lowest index. The cursor advances by exactly
        // one from its prior value, not to the selected position.
        let mut selected = 0;
        let mut shortest = Duration::MAX;
        for (index, worker) in workers.iter().enumerate() {
            let wait = match state.last_used.get(&worker.id) {
                Some(&used) => self
                    .cooldown
                    .saturating_sub(now.saturating_duration_since(used)),
                None => Duration::ZERO,
            };
            if wait < shortest {
                shortest = wait;
                selected = index;
            }
        }

        state.cursor = (state.cursor + 1) % count;
        let worker = &workers[selected];
        state.last_used.insert(worker.id, now);
        warn!(
            worker_id = worker.id,
            wait = ?shortest,
            "all workers cooling, forcing the one with the smallest remaining wait"
        );
        Ok(Arc::clone(worker))
    }

    /// Occupancy counts as of now.
    pub fn stats(&self) -> SchedulerStats {
        self.stats_at(Instant::now())
    }

    fn stats_at(&self, now: Instant) -> SchedulerStats {
        let workers = self.pool.workers();
        let state = self.state.lock();
        let mut available = 0;
        let mut cooling = 0;
        for worker in &workers {
            match state.last_used.get(&worker.id) {
                Some(&used) if now.saturating_duration_since(used) <= self.cooldown => cooling += 1,
                _ => available += 1,
            }
        }
        SchedulerStats {
            total_workers: workers.len(),
            available_workers: available,
            cooling_workers: cooling,
            cooldown: self.cooldown,
        }
    }
}
