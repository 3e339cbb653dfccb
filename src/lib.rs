//! Caching, credential-pooling gateway in front of a rate-limited transit API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http (request id, trace, timeout, shared secret, gzip)
//!                  │
//!                  ▼
//!               gateway::Gateway::handle
//!                  │  cache::ResponseCache ── hit ──▶ X-Cache: HIT
//!                  │  collapse::CollapsingFetcher (one fetch per key)
//!                  │  credentials::CredentialPool (token bucket per key)
//!                  ▼
//!               upstream::HttpUpstream ──▶ transit API
//!
//!     Cross-cutting: config, lifecycle (signals, shutdown), observability
//! ```

// Core subsystems
pub mod cache;
pub mod collapse;
pub mod credentials;
pub mod gateway;
pub mod upstream;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
