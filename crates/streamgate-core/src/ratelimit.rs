//! Per-caller sliding-window rate limiting
//!
//! Two independent rolling windows bound upload frequency: one over the
//! trailing minute, one over the trailing hour. Denials carry the wait until
//! the oldest in-window timestamp exits, so callers can be told when to
//! retry. History older than an hour is purged on every call, amortized over
//! traffic rather than a background timer.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Outcome of a rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Denied, with the suggested wait before retrying.
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn retry_after(&self) -> Duration {
        match self {
            Self::Allowed => Duration::ZERO,
            Self::Denied { retry_after } => *retry_after,
        }
    }
}

/// Bounds uploads per caller over rolling one-minute and one-hour windows.
pub struct RateLimiter {
    history: Mutex<HashMap<String, Vec<Instant>>>,
    max_per_minute: usize,
    max_per_hour: usize,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize, max_per_hour: usize) -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            max_per_minute,
            max_per_hour,
        }
    }

    /// Check the caller against both windows and, if allowed, record this
    /// upload. Runs under a single lock per call.
    pub fn check_and_record(&self, caller: &str) -> RateDecision {
        self.check_and_record_at(caller, Instant::now())
    }

    pub fn check_and_record_at(&self, caller: &str, now: Instant) -> RateDecision {
        let mut history = self.history.lock();

        // Amortized global purge: drop anything older than an hour and
        // delete callers whose history emptied, so stale keys cannot
        // accumulate.
        history.retain(|_, stamps| {
            stamps.retain(|&t| now.saturating_duration_since(t) < HOUR);
            !stamps.is_empty()
        });

        let stamps = history.entry(caller.to_string()).or_default();

        if let Some(wait) = window_wait(stamps, now, MINUTE, self.max_per_minute) {
            return RateDecision::Denied { retry_after: wait };
        }
        if let Some(wait) = window_wait(stamps, now, HOUR, self.max_per_hour) {
            return RateDecision::Denied { retry_after: wait };
        }

        stamps.push(now);
        RateDecision::Allowed
    }
}

/// If the caller has reached `max` events inside `window`, return how long
/// until the oldest of them leaves the window. Nothing is recorded on a
/// denial.
fn window_wait(stamps: &[Instant], now: Instant, window: Duration, max: usize) -> Option<Duration> {
    let in_window: Vec<Instant> = stamps
        .iter()
        .copied()
        .filter(|&t| now.saturating_duration_since(t) < window)
        .collect();
    if in_window.len() < max {
        return None;
    }
    match in_window.iter().copied().min() {
        Some(oldest) => Some(window.saturating_sub(now.saturating_duration_since(oldest))),
        // A bound of zero admits nothing; the full window is the wait.
        None => Some(window),
    }
}
