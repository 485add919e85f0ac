//! In-memory relay for testing and development fallback

use crate::client::{RelayConnector, RelaySession};
use crate::types::{AccountInfo, Delivery, MediaPayload, UploadHandle};
use crate::{RelayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A connector that accepts any non-empty credential and hands out
/// [`MemoryRelay`] sessions backed by a shared message log.
#[derive(Default)]
pub struct MemoryConnector {
    log: Arc<MessageLog>,
    next_account: AtomicI64,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered through all sessions of this connector.
    pub fn delivered(&self) -> Vec<DeliveredMessage> {
        self.log.messages.lock().clone()
    }
}

#[async_trait]
impl RelayConnector for MemoryConnector {
    async fn connect(&self, credential: &str) -> Result<Box<dyn RelaySession>> {
        if credential.is_empty() {
            return Err(RelayError::Authentication("empty credential".into()));
        }
        let id = self.next_account.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MemoryRelay {
            account: AccountInfo {
                account_id: id,
                username: format!("memory-{id}"),
            },
            log: Arc::clone(&self.log),
        }))
    }
}

/// A message recorded by the memory relay.
#[derive(Clone, Debug)]
pub struct DeliveredMessage {
    pub message_id: i64,
    pub file_id: i64,
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub caption: String,
    pub sender_account_id: i64,
}

#[derive(Default)]
struct MessageLog {
    next_message: AtomicI64,
    next_file: AtomicI64,
    messages: Mutex<Vec<DeliveredMessage>>,
}

/// Deterministic in-process session: monotonic message and file ids, all
/// deliveries recorded for inspection.
pub struct MemoryRelay {
    account: AccountInfo,
    log: Arc<MessageLog>,
}

#[async_trait]
impl RelaySession for MemoryRelay {
    fn account(&self) -> &AccountInfo {
        &self.account
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<UploadHandle> {
        let id = self.log.next_file.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadHandle {
            upload_id: id,
            name: name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn send_media(&self, payload: MediaPayload) -> Result<Delivery> {
        let message_id = self.log.next_message.fetch_add(1, Ordering::SeqCst) + 1;
        let file_id = payload.handle.upload_id;
        self.log.messages.lock().push(DeliveredMessage {
            message_id,
            file_id,
            filename: payload.filename,
            size: payload.handle.size,
            mime_type: payload.mime_type,
            caption: payload.caption,
            sender_account_id: self.account.account_id,
        });
        Ok(Delivery {
            message_id,
            file_id: Some(file_id),
        })
    }
}
