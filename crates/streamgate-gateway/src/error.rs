//! API error types and the JSON error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use streamgate_core::CoreError;
use streamgate_relay::RelayError;
use thiserror::Error;

/// Machine-readable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    InvalidRequest,
    RateLimited,
    QuotaExceeded,
    FileTooLarge,
    ValidationFailed,
    NoWorkers,
    RelayFailed,
    RelayTimeout,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::InvalidRequest => "InvalidRequest",
            Self::RateLimited => "RateLimited",
            Self::QuotaExceeded => "QuotaExceeded",
            Self::FileTooLarge => "FileTooLarge",
            Self::ValidationFailed => "ValidationFailed",
            Self::NoWorkers => "NoWorkers",
            Self::RelayFailed => "RelayFailed",
            Self::RelayTimeout => "RelayTimeout",
            Self::InternalError => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest | Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::QuotaExceeded => StatusCode::FORBIDDEN,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NoWorkers => StatusCode::SERVICE_UNAVAILABLE,
            Self::RelayFailed | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RelayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication failed")]
    Unauthorized,

    #[error("rate limit exceeded, retry in {}s", wait.as_secs())]
    RateLimited { wait: Duration },

    #[error("{0}")]
    BadRequest(String),

    #[error("relay timed out")]
    RelayTimeout,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("relay failed: {0}")]
    Relay(#[from] RelayError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::BadRequest(_) => ErrorCode::InvalidRequest,
            Self::RelayTimeout => ErrorCode::RelayTimeout,
            Self::Core(e) => match e {
                CoreError::NoWorkers => ErrorCode::NoWorkers,
                CoreError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
                CoreError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
                CoreError::DisallowedExtension(_)
                | CoreError::DisallowedMime(_)
                | CoreError::ContentMismatch { .. } => ErrorCode::ValidationFailed,
            },
            Self::Relay(_) => ErrorCode::RelayFailed,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<f64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let wait_seconds = match &self {
            ApiError::RateLimited { wait } => Some(wait.as_secs_f64()),
            _ => None,
        };
        let body = ErrorBody {
            code: code.as_str(),
            error: self.to_string(),
            wait_seconds,
        };
        (code.status_code(), Json(body)).into_response()
    }
}
