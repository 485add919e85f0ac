//! Status, metrics, and health handlers

use crate::metrics::MetricsSnapshot;
use crate::middleware::CallerIdentity;
use crate::AppState;
use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub caller_id: String,
    pub used_quota: u64,
    pub max_quota: u64,
    pub unlimited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

/// GET /upload/status - current quota usage for the caller
pub async fn upload_status(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
) -> Json<QuotaStatus> {
    let used = state.quota.usage(&caller.0);
    let max = state.quota.max_quota();
    let unlimited = state.quota.is_unlimited();
    Json(QuotaStatus {
        caller_id: caller.0.clone(),
        used_quota: used,
        max_quota: max,
        unlimited,
        quota_percent: (!unlimited).then(|| used as f64 / max as f64 * 100.0),
        remaining: state.quota.remaining(&caller.0),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub total_workers: usize,
    pub available_workers: usize,
    pub cooling_workers: usize,
    pub cooldown_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub metrics: MetricsSnapshot,
    pub workers: WorkerStats,
    pub timestamp: i64,
}

/// GET /upload/metrics - aggregate upload counters and worker occupancy
pub async fn upload_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let stats = state.scheduler.stats();
    Json(MetricsResponse {
        metrics: state.metrics.snapshot(),
        workers: WorkerStats {
            total_workers: stats.total_workers,
            available_workers: stats.available_workers,
            cooling_workers: stats.cooling_workers,
            cooldown_seconds: stats.cooldown.as_secs(),
        },
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    pub message: &'static str,
    pub ok: bool,
    pub uptime: String,
    pub version: &'static str,
    pub workers: usize,
}

/// GET / - liveness and uptime
pub async fn health(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Server is running.",
        ok: true,
        uptime: format_uptime(state.started_at.elapsed().as_secs()),
        version: env!("CARGO_PKG_VERSION"),
        workers: state.pool.len(),
    })
}

/// Render seconds as a compact `1d 2h 3m 4s` string.
fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(3_661), "1h 1m 1s");
        assert_eq!(format_uptime(90_061), "1d 1h 1m 1s");
        assert_eq!(format_uptime(86_400), "1d 0s");
    }
}
