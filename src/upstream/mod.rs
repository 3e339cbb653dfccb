//! Upstream provider subsystem.
//!
//! # Data Flow
//! ```text
//! CacheKey (path + canonical params) + leased credential
//!     → endpoint.rs (base URL + path, client auth param dropped, credential appended)
//!     → client.rs (GET with transport timeout, body read in full)
//!     → UpstreamResponse { status, content type, body } or FetchError
//! ```
//!
//! # Design Decisions
//! - `UpstreamClient` is the seam the orchestrator is generic over; tests
//!   substitute an in-process upstream
//! - Non-200 statuses are responses, not errors; only transport problems fail
//! - No retries here: a retry would spend another credential token

pub mod client;
pub mod endpoint;

pub use client::{FetchError, HttpUpstream, UpstreamClient, UpstreamResponse};
pub use endpoint::UpstreamUrl;
