//! Shared types for the relay boundary

use serde::{Deserialize, Serialize};

/// Self-identity record of an authenticated backend account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Backend-assigned account identifier
    pub account_id: i64,
    /// Human-readable account name
    pub username: String,
}

/// Opaque handle to bytes already uploaded to the backend, awaiting
/// attachment to a message.
#[derive(Clone, Debug)]
pub struct UploadHandle {
    pub upload_id: i64,
    pub name: String,
    pub size: u64,
}

/// How the backend should treat an attached file.
///
/// Classified from the declared MIME type: `image/*` maps to [`Photo`],
/// `video/*` to [`Video`], `audio/*` to [`Audio`], anything else to
/// [`Document`].
///
/// [`Photo`]: MediaKind::Photo
/// [`Video`]: MediaKind::Video
/// [`Audio`]: MediaKind::Audio
/// [`Document`]: MediaKind::Document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    /// Classify a declared MIME type string.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            Self::Photo
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Document
        }
    }
}

/// A message-with-media send request.
#[derive(Clone, Debug)]
pub struct MediaPayload {
    pub handle: UploadHandle,
    pub kind: MediaKind,
    pub mime_type: String,
    pub filename: String,
    /// Caption attached to the relayed message
    pub caption: String,
}

/// Result of a successful media send.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Identifier of the message carrying the file
    pub message_id: i64,
    /// Backend file identifier, when the backend exposes one
    pub file_id: Option<i64>,
}

impl Delivery {
    /// Backend file identifier, falling back to the message identifier when
    /// the backend did not expose one.
    pub fn file_id_or_message_id(&self) -> i64 {
        self.file_id.unwrap_or(self.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_classification() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Photo);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime("text/plain"), MediaKind::Document);
    }

    #[test]
    fn test_delivery_file_id_fallback() {
        let with_file = Delivery { message_id: 10, file_id: Some(77) };
        assert_eq!(with_file.file_id_or_message_id(), 77);

        let without_file = Delivery { message_id: 10, file_id: None };
        assert_eq!(without_file.file_id_or_message_id(), 10);
    }
}
