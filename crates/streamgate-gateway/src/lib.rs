//! # StreamGate Gateway
//!
//! HTTP upload gateway fronting a pool of authenticated relay workers.
//!
//! This crate provides:
//! - **Upload API**: single and batch multipart uploads answered with
//!   capability retrieval links
//! - **Admission control**: bearer auth, per-caller rate limiting, storage
//!   quotas, and file validation ahead of any relay traffic
//! - **Worker scheduling**: cooldown-aware selection over the worker pool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP Clients                       │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                StreamGate Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Auth Middleware │ Rate Limiter │ File Validator    │
//! ├─────────────────────────────────────────────────────┤
//! │     Quota Ledger │ Upload Scheduler │ Metrics       │
//! ├─────────────────────────────────────────────────────┤
//! │               streamgate-core                       │
//! ├─────────────────────────────────────────────────────┤
//! │               streamgate-relay                      │
//! │        (authenticated backend sessions)             │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::{ApiError, ErrorCode};
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
