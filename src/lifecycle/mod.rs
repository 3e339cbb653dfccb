//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast
//!         → HttpServer stops accepting, drains in-flight requests
//!         → CacheSweeper exits its loop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config, logging, metrics, listener
//! - One broadcast reaches every long-running task

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
