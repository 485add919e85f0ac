//! StreamGate - HTTP upload gateway over a pool of relay workers

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use streamgate_gateway::{run_server_with_shutdown, GatewayConfig};
use streamgate_relay::MemoryConnector;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "streamgate")]
#[command(about = "Upload gateway relaying files through authenticated backend workers")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "STREAMGATE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "STREAMGATE_PORT")]
    port: u16,

    /// Public base URL embedded in retrieval links
    #[arg(long, env = "STREAMGATE_PUBLIC_URL")]
    public_url: Option<String>,

    /// Bearer token authorizing the upload API
    #[arg(long, env = "UPLOAD_AUTH_TOKEN", default_value = "")]
    upload_auth_token: String,

    /// Backend worker credentials, comma-separated
    #[arg(long, env = "WORKER_CREDENTIALS", value_delimiter = ',')]
    worker_credentials: Vec<String>,

    /// Directory for backend session persistence
    #[arg(long, env = "SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Maximum file size in bytes
    #[arg(long, default_value = "2147483648", env = "MAX_FILE_SIZE")]
    max_file_size: u64,

    /// Per-caller storage quota in bytes (0 = unlimited)
    #[arg(long, default_value = "0", env = "USER_QUOTA")]
    user_quota: u64,

    /// Allowed MIME types, comma-separated
    #[arg(
        long,
        default_value = "image/jpeg,image/png,image/gif,video/mp4,application/pdf,text/plain,application/zip",
        env = "ALLOWED_MIME_TYPES"
    )]
    allowed_mime_types: String,

    /// Allowed file extensions, comma-separated
    #[arg(
        long,
        default_value = ".jpg,.jpeg,.png,.gif,.mp4,.pdf,.txt,.zip",
        env = "ALLOWED_EXTENSIONS"
    )]
    allowed_extensions: String,

    /// Uploads allowed per caller per minute
    #[arg(long, default_value = "5", env = "UPLOADS_PER_MINUTE")]
    uploads_per_minute: usize,

    /// Uploads allowed per caller per hour
    #[arg(long, default_value = "50", env = "UPLOADS_PER_HOUR")]
    uploads_per_hour: usize,

    /// Per-worker upload cooldown in seconds (0 disables)
    #[arg(long, default_value = "1", env = "API_COOLDOWN_SECONDS")]
    cooldown_seconds: u64,

    /// Reject files whose content contradicts the declared type
    #[arg(long, env = "ENABLE_DEEP_SCAN")]
    deep_scan: bool,

    /// Capability token length in retrieval links (5-32)
    #[arg(long, default_value = "6", env = "HASH_LENGTH")]
    hash_length: usize,

    /// Bound on the relay step of one upload, in seconds
    #[arg(long, default_value = "120", env = "RELAY_TIMEOUT_SECS")]
    relay_timeout_secs: u64,

    /// Use the in-memory relay (data is not persisted)
    #[arg(long, env = "STREAMGATE_MEMORY_RELAY")]
    memory_relay: bool,

    /// Enable debug logging
    #[arg(short, long, env = "STREAMGATE_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("streamgate_gateway={log_level},streamgate_core={log_level},tower_http=debug").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let public_url = args
        .public_url
        .unwrap_or_else(|| format!("http://{}:{}", args.host, args.port));

    tracing::info!("Starting StreamGate on {}:{}", args.host, args.port);
    tracing::info!("Retrieval links use {}", public_url);

    if args.upload_auth_token.is_empty() {
        tracing::warn!("no upload auth token configured; all upload requests will be rejected");
    }

    let mut config = GatewayConfig {
        host: args.host,
        port: args.port,
        public_url,
        upload_auth_token: args.upload_auth_token,
        credentials: args.worker_credentials,
        session_dir: args.session_dir,
        max_file_size: args.max_file_size,
        user_quota: args.user_quota,
        allowed_mime_types: args.allowed_mime_types,
        allowed_extensions: args.allowed_extensions,
        uploads_per_minute: args.uploads_per_minute,
        uploads_per_hour: args.uploads_per_hour,
        cooldown_seconds: args.cooldown_seconds,
        deep_scan: args.deep_scan,
        hash_length: args.hash_length,
        relay_timeout_secs: args.relay_timeout_secs,
    };
    config.normalize();

    // The memory relay stands in until an external connector is wired up;
    // it accepts every credential and stores nothing durable.
    if args.memory_relay {
        tracing::warn!("using in-memory relay - uploads will NOT persist!");
    } else {
        tracing::warn!("no external relay connector configured, falling back to in-memory relay");
    }
    let connector = Arc::new(MemoryConnector::new());

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };

    run_server_with_shutdown(config, connector, shutdown).await
}
