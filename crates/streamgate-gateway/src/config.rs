//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Display length bounds for capability tokens.
const MIN_HASH_LENGTH: usize = 5;
const MAX_HASH_LENGTH: usize = 32;
const DEFAULT_HASH_LENGTH: usize = 6;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL embedded in retrieval links
    pub public_url: String,
    /// Static bearer token authorizing the upload API
    pub upload_auth_token: String,
    /// Backend credentials, one worker each
    pub credentials: Vec<String>,
    /// Directory for backend session persistence; created at startup when
    /// set, and the only process-fatal initialization step
    pub session_dir: Option<PathBuf>,
    /// Maximum file size (bytes)
    pub max_file_size: u64,
    /// Per-caller storage quota (bytes); zero means unlimited
    pub user_quota: u64,
    /// Allowed MIME types, comma-separated exact strings
    pub allowed_mime_types: String,
    /// Allowed file extensions, comma-separated exact strings
    pub allowed_extensions: String,
    /// Uploads allowed per caller per rolling minute
    pub uploads_per_minute: usize,
    /// Uploads allowed per caller per rolling hour
    pub uploads_per_hour: usize,
    /// Per-worker upload cooldown (seconds); zero disables the cooldown
    pub cooldown_seconds: u64,
    /// Reject files whose sniffed content contradicts the declared type
    pub deep_scan: bool,
    /// Capability token display length, clamped to 5..=32
    pub hash_length: usize,
    /// Bound on the relay step of one upload (seconds)
    pub relay_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            upload_auth_token: String::new(),
            credentials: Vec::new(),
            session_dir: None,
            max_file_size: 2 * 1024 * 1024 * 1024, // 2 GB
            user_quota: 0,
            allowed_mime_types: "image/jpeg,image/png,image/gif,video/mp4,application/pdf,text/plain,application/zip".to_string(),
            allowed_extensions: ".jpg,.jpeg,.png,.gif,.mp4,.pdf,.txt,.zip".to_string(),
            uploads_per_minute: 5,
            uploads_per_hour: 50,
            cooldown_seconds: 1,
            deep_scan: false,
            hash_length: DEFAULT_HASH_LENGTH,
            relay_timeout_secs: 120,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamp out-of-range values to their documented bounds.
    pub fn normalize(&mut self) {
        if self.hash_length == 0 {
            info!("hash length can't be 0, defaulting to {DEFAULT_HASH_LENGTH}");
            self.hash_length = DEFAULT_HASH_LENGTH;
        }
        if self.hash_length > MAX_HASH_LENGTH {
            info!("hash length can't exceed {MAX_HASH_LENGTH}, clamping");
            self.hash_length = MAX_HASH_LENGTH;
        }
        if self.hash_length < MIN_HASH_LENGTH {
            info!("hash length can't be below {MIN_HASH_LENGTH}, defaulting to {DEFAULT_HASH_LENGTH}");
            self.hash_length = DEFAULT_HASH_LENGTH;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_length_clamping() {
        let mut config = GatewayConfig { hash_length: 0, ..Default::default() };
        config.normalize();
        assert_eq!(config.hash_length, 6);

        config.hash_length = 3;
        config.normalize();
        assert_eq!(config.hash_length, 6);

        config.hash_length = 100;
        config.normalize();
        assert_eq!(config.hash_length, 32);

        config.hash_length = 12;
        config.normalize();
        assert_eq!(config.hash_length, 12);
    }

    #[test]
    fn test_bind_addr() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
