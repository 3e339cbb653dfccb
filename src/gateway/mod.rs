//! Request orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Client URI
//!     → CacheKey (path + sorted params, auth param stripped)
//!     → ResponseCache lookup ── fresh ──→ ClientResponse (X-Cache: HIT)
//!     → miss: CollapsingFetcher.run(key)
//!         leader:  CredentialPool.acquire() ── none ──→ RateLimited
//!                  UpstreamUrl.build (one pool credential)
//!                  UpstreamClient.fetch
//!                  200 → ResponseCache insert
//!         waiters: same outcome, shared
//!     → ClientResponse (X-Cache: MISS, X-Collapsed: TRUE when shared)
//!       or 429 / 502 with no cache header
//! ```

pub mod orchestrator;
pub mod response;

pub use crate::upstream::FetchError;
pub use orchestrator::Gateway;
pub use response::{CacheStatus, ClientResponse};
