//! Error types for the streamgate-relay crate

use thiserror::Error;

/// Result type alias using `RelayError`
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can occur at the relay boundary
#[derive(Error, Debug)]
pub enum RelayError {
    /// Credential was rejected by the backend
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Upload of raw bytes failed
    #[error("upload failed: {0}")]
    Upload(String),

    /// Sending the media message failed
    #[error("send failed: {0}")]
    Send(String),

    /// The backend returned a response the client could not interpret
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),
}
