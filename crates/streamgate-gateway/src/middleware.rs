//! HTTP middleware for authentication, request ids, and request logging

use crate::{ApiError, AppState};
use crate::state::caller_identity;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Opaque per-caller identity, derived from the bearer token by the auth
/// middleware and consumed by the rate limiter and quota ledger.
#[derive(Clone)]
pub struct CallerIdentity(pub String);

/// Request ID extension
#[derive(Clone)]
pub struct RequestId(pub String);

/// Extract bearer token from an Authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Authentication middleware: a single static bearer-token comparison.
///
/// An empty configured token disables the upload API entirely rather than
/// leaving it open.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let configured = state.config.upload_auth_token.as_str();
    if configured.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or(ApiError::Unauthorized)?;

    if token != configured {
        return Err(ApiError::Unauthorized);
    }

    let identity = caller_identity(token);
    request.extensions_mut().insert(CallerIdentity(identity));

    Ok(next.run(request).await)
}

/// Request ID middleware - adds an x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}
