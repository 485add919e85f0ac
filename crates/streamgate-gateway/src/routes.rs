//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave slack above the file-size cap for multipart framing.
    let body_limit = state.config.max_file_size.saturating_add(1024 * 1024) as usize;

    // The four upload operations sit behind the bearer-token gate; the root
    // health probe stays public.
    let upload_routes = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/upload/batch", post(handlers::upload_batch))
        .route("/upload/status", get(handlers::upload_status))
        .route("/upload/metrics", get(handlers::upload_metrics))
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::health))
        .merge(upload_routes)
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
