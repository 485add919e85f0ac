//! # StreamGate Core
//!
//! Admission control and worker scheduling for the StreamGate gateway.
//!
//! Every upload passes through one pipeline built from these pieces:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Upload request                      │
//! ├──────────────────────────────────────────────────────┤
//! │ RateLimiter  │ FileValidator │ QuotaLedger (reserve) │
//! ├──────────────────────────────────────────────────────┤
//! │       UploadScheduler  ──▶  WorkerPool               │
//! ├──────────────────────────────────────────────────────┤
//! │   relay  ──▶  QuotaLedger (commit)  ──▶  link        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The pool holds the authenticated backend sessions; the scheduler spreads
//! upload traffic across them while honoring a per-worker cooldown; the
//! limiter, ledger, and validator gate requests before any byte is relayed;
//! the link module derives the capability token embedded in retrieval URLs.

pub mod error;
pub mod link;
pub mod pool;
pub mod quota;
pub mod ratelimit;
pub mod scheduler;
pub mod validator;

pub use error::{CoreError, Result};
pub use link::{download_url, pack, short_hash, stream_url};
pub use pool::{Worker, WorkerId, WorkerPool, BRING_UP_TIMEOUT};
pub use quota::{QuotaLedger, Reservation};
pub use ratelimit::{RateDecision, RateLimiter};
pub use scheduler::{SchedulerStats, UploadScheduler};
pub use validator::{sanitize_filename, FileValidator};
