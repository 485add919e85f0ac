//! # StreamGate Relay
//!
//! Boundary between the gateway and the backend relay platform.
//!
//! This crate provides:
//! - **Session traits**: authenticate a credential into a session, upload
//!   raw bytes, send media and learn the delivery identifiers
//! - **Shared types**: account identity, media payloads, delivery results
//! - **Memory relay**: a deterministic in-process implementation used for
//!   development fallback and tests
//!
//! Retries, backoff, and flood-control semantics for backend calls are the
//! responsibility of the concrete connector, not of this interface.

pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::{RelayConnector, RelaySession};
pub use error::{RelayError, Result};
pub use memory::{MemoryConnector, MemoryRelay};
pub use types::{AccountInfo, Delivery, MediaKind, MediaPayload, UploadHandle};
