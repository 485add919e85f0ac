//! Aggregate upload counters

use parking_lot::Mutex;
use serde::Serialize;

#[derive(Default)]
struct Counters {
    total_uploads: u64,
    total_bytes: u64,
    failed_uploads: u64,
    blocked_uploads: u64,
}

/// Process-wide upload counters behind one lock.
#[derive(Default)]
pub struct UploadMetrics {
    inner: Mutex<Counters>,
}

/// Point-in-time counter values for the metrics endpoint.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_uploads: u64,
    pub total_size: u64,
    pub failed_uploads: u64,
    pub blocked_uploads: u64,
    pub average_size: f64,
}

impl UploadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, size: u64) {
        let mut c = self.inner.lock();
        c.total_uploads += 1;
        c.total_bytes += size;
    }

    pub fn record_failure(&self) {
        let mut c = self.inner.lock();
        c.total_uploads += 1;
        c.failed_uploads += 1;
    }

    /// An upload denied by admission control before entering the pipeline.
    pub fn record_blocked(&self) {
        self.inner.lock().blocked_uploads += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.inner.lock();
        let average_size = if c.total_uploads > 0 {
            c.total_bytes as f64 / c.total_uploads as f64
        } else {
            0.0
        };
        MetricsSnapshot {
            total_uploads: c.total_uploads,
            total_size: c.total_bytes,
            failed_uploads: c.failed_uploads,
            blocked_uploads: c.blocked_uploads,
            average_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_size() {
        let metrics = UploadMetrics::new();
        metrics.record_success(100);
        metrics.record_success(300);
        let snap = metrics.snapshot();
        assert_eq!(snap.total_uploads, 2);
        assert_eq!(snap.total_size, 400);
        assert!((snap.average_size - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failures_count_into_totals() {
        let metrics = UploadMetrics::new();
        metrics.record_success(100);
        metrics.record_failure();
        metrics.record_blocked();
        let snap = metrics.snapshot();
        assert_eq!(snap.total_uploads, 2);
        assert_eq!(snap.failed_uploads, 1);
        assert_eq!(snap.blocked_uploads, 1);
        assert!((snap.average_size - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_snapshot_has_zero_average() {
        assert_eq!(UploadMetrics::new().snapshot().average_size, 0.0);
    }
}
