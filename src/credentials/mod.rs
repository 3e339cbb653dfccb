//! Upstream credential subsystem.
//!
//! # Data Flow
//! ```text
//! Cache miss, collapsed fetch elected to run:
//!     → pool.rs (scan from rotation cursor)
//!     → bucket.rs (lazy refill, try to take one token)
//!     → first credential with a token is leased, cursor advances
//!     → none left: caller surfaces "rate limit exceeded"
//! ```
//!
//! # Design Decisions
//! - Limits apply to upstream credentials only, never to downstream clients
//! - A failed upstream call still spends its token (the call was attempted)
//! - One critical section per acquire; no waiting for refill

pub mod bucket;
pub mod pool;

pub use bucket::TokenBucket;
pub use pool::{CredentialLease, CredentialPool, Secret};
