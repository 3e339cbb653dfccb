//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request URI
//!     → key.rs (canonical path + sorted params, auth param stripped)
//!     → store.rs lookup (fresh? → HIT, serve stored status/type/body)
//!     → miss → collapsed upstream fetch → 200 only → store.rs insert (fixed TTL)
//!
//! Background:
//!     sweeper.rs → purge_expired() every sweep interval
//! ```
//!
//! # Design Decisions
//! - Time-based expiry only; no size bound or eviction under memory pressure
//! - Expiry is checked on read; the sweep only reclaims memory
//! - Only HTTP 200 responses are ever stored; failures never poison a key

pub mod key;
pub mod store;
pub mod sweeper;

pub use key::CacheKey;
pub use store::ResponseCache;
pub use sweeper::CacheSweeper;
