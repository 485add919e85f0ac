//! Capability tokens for retrieval links
//!
//! A token is derived, never stored: an MD5 digest over the file's metadata
//! tuple, truncated to a configured display length and embedded as a query
//! parameter. Any holder of the same tuple can recompute the token, so it is
//! capability-by-possession-of-metadata rather than cryptographic proof of
//! authorization.

use md5::{Digest, Md5};

/// Digest the metadata tuple in fixed field order with no separators.
/// Numeric fields contribute their decimal string representation.
pub fn pack(filename: &str, size: u64, mime_type: &str, file_id: i64) -> String {
    let mut hasher = Md5::new();
    hasher.update(filename.as_bytes());
    hasher.update(size.to_string().as_bytes());
    hasher.update(mime_type.as_bytes());
    hasher.update(file_id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Truncate a hex digest to the configured display length. Configuration
/// loading clamps the length to 5..=32.
pub fn short_hash(digest: &str, length: usize) -> &str {
    &digest[..length.min(digest.len())]
}

/// Streaming URL for a relayed file.
pub fn stream_url(host: &str, message_id: i64, token: &str) -> String {
    format!("{host}/stream/{message_id}?hash={token}")
}

/// Download variant of the streaming URL.
pub fn download_url(host: &str, message_id: i64, token: &str) -> String {
    format!("{host}/stream/{message_id}?hash={token}&d=true")
}
