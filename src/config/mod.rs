//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay FIVEONEONE_API_KEY_<n>, secret env)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the credential pool is built once
//! - All fields have defaults to allow minimal configs
//! - Credentials normally come from the environment, never from logs

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env, apply_process_env, load_config, load_gateway_config, ConfigError};
pub use schema::{
    AuthConfig, CacheConfig, CompressionConfig, CredentialsConfig, GatewayConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
