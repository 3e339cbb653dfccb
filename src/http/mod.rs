//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → /up → "OK"
//!     → /{*path}
//!         → middleware/auth.rs (shared secret, 401 on mismatch)
//!         → gateway::Gateway::handle (cache, collapse, upstream)
//!         → compression (gzip when the client accepts it)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
