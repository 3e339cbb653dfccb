pub mod auth;

pub use auth::{require_shared_secret, SharedSecret};
