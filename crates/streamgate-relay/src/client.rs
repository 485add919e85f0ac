//! Relay session traits
//!
//! The gateway consumes the backend platform through these two traits:
//! a connector turns a credential into an authenticated session, and a
//! session uploads bytes and sends media messages.

use crate::types::{AccountInfo, Delivery, MediaPayload, UploadHandle};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Authenticates credentials into sessions.
///
/// Implementations own the protocol handshake, encryption, and any
/// flood-wait handling; callers only see the session handle or an error.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    /// Authenticate a single backend credential and return a live session.
    async fn connect(&self, credential: &str) -> Result<Box<dyn RelaySession>>;
}

/// One authenticated backend connection.
#[async_trait]
pub trait RelaySession: Send + Sync {
    /// Self-identity of the authenticated account.
    fn account(&self) -> &AccountInfo;

    /// Upload raw bytes, returning an opaque handle for later attachment.
    async fn upload(&self, name: &str, data: Bytes) -> Result<UploadHandle>;

    /// Send a message with attached media to the storage channel.
    async fn send_media(&self, payload: MediaPayload) -> Result<Delivery>;
}
