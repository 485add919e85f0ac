//! HTTP request handlers

pub mod status;
pub mod upload;

pub use status::{health, upload_metrics, upload_status};
pub use upload::{upload, upload_batch};
