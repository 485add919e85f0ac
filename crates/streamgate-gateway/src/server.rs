//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use std::sync::Arc;
use streamgate_relay::RelayConnector;
use tokio::net::TcpListener;
use tracing::info;

/// Run the gateway server
pub async fn run_server(
    config: GatewayConfig,
    connector: Arc<dyn RelayConnector>,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), connector).await?);
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("StreamGate listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    connector: Arc<dyn RelayConnector>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), connector).await?);
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("StreamGate listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("gateway shutdown complete");

    Ok(())
}
