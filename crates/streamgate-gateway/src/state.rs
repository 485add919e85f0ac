//! Application state

use crate::config::GatewayConfig;
use crate::metrics::UploadMetrics;
use anyhow::Context;
use std::sync::Arc;
use std::time::{Duration, Instant};
use streamgate_core::{FileValidator, QuotaLedger, RateLimiter, UploadScheduler, WorkerPool};
use streamgate_relay::RelayConnector;
use tracing::{info, warn};

/// Derive the opaque caller identity from a raw bearer token.
///
/// The gateway has no account system; rate limiting and quotas key on a
/// stable hash of the token itself. Domain separation keeps the value
/// distinct from any other use of the same hash.
pub fn caller_identity(token: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"streamgate:caller:");
    hasher.update(token.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash.as_bytes()[..16])
}

/// Application state shared across handlers.
///
/// All admission services are explicit objects constructed once here and
/// reached through the router state, never through globals.
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// The worker pool, populated at bring-up
    pub pool: Arc<WorkerPool>,
    /// Cooldown-aware upload scheduling over the pool
    pub scheduler: UploadScheduler,
    /// Per-caller sliding-window rate limiting
    pub rate_limiter: RateLimiter,
    /// Per-caller storage accounting
    pub quota: QuotaLedger,
    /// File admission gate
    pub validator: FileValidator,
    /// Aggregate upload counters
    pub metrics: UploadMetrics,
    /// Process start, for the health endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Bring up the worker pool and assemble the admission services.
    ///
    /// Worker bring-up failures degrade the pool but never fail startup;
    /// the only fatal step is initializing the session directory when one
    /// is configured.
    pub async fn new(
        config: GatewayConfig,
        connector: Arc<dyn RelayConnector>,
    ) -> anyhow::Result<Self> {
        if let Some(dir) = &config.session_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create session directory {}", dir.display()))?;
            info!(dir = %dir.display(), "using session directory");
        }

        let pool = Arc::new(WorkerPool::new());
        let (succeeded, total) = pool.bring_up(connector, &config.credentials).await;
        if total > 0 && succeeded == 0 {
            warn!("no workers came up; uploads will fail until a worker joins");
        }

        let scheduler = UploadScheduler::new(
            Arc::clone(&pool),
            Duration::from_secs(config.cooldown_seconds),
        );
        let rate_limiter = RateLimiter::new(config.uploads_per_minute, config.uploads_per_hour);
        let quota = QuotaLedger::new(config.user_quota);
        if quota.is_unlimited() {
            info!("user quota is 0, treating as unlimited");
        }
        let validator = FileValidator::new(
            &config.allowed_mime_types,
            &config.allowed_extensions,
            config.max_file_size,
            config.deep_scan,
        );

        Ok(Self {
            config,
            pool,
            scheduler,
            rate_limiter,
            quota,
            validator,
            metrics: UploadMetrics::new(),
            started_at: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_identity_is_stable_and_opaque() {
        let a = caller_identity("secret-token");
        let b = caller_identity("secret-token");
        let c = caller_identity("other-token");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
        assert!(!a.contains("secret"));
    }

    #[tokio::test]
    async fn test_session_dir_is_created_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions");
        let config = GatewayConfig {
            session_dir: Some(path.clone()),
            ..Default::default()
        };
        let state = AppState::new(config, Arc::new(streamgate_relay::MemoryConnector::new()))
            .await
            .unwrap();
        assert!(path.is_dir());
        // No credentials configured: the pool starts empty but startup
        // still succeeds.
        assert!(state.pool.is_empty());
    }
}
