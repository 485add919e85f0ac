//! Error types for the streamgate-core crate

use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the admission pipeline
#[derive(Error, Debug)]
pub enum CoreError {
    /// The worker pool is empty
    #[error("no workers available")]
    NoWorkers,

    /// The caller's cumulative storage would exceed its quota
    #[error("storage quota exceeded: {used} of {max} bytes used, {requested} more requested")]
    QuotaExceeded {
        used: u64,
        max: u64,
        requested: u64,
    },

    /// File larger than the configured maximum
    #[error("file size {size} exceeds maximum {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// File extension not in the allow-list
    #[error("file extension not allowed: {0:?}")]
    DisallowedExtension(String),

    /// Declared MIME type not in the allow-list
    #[error("MIME type not allowed: {0:?}")]
    DisallowedMime(String),

    /// Sniffed content does not match the declared MIME type
    #[error("file content does not match declared type (declared {declared:?}, detected {detected:?})")]
    ContentMismatch { declared: String, detected: String },
}
