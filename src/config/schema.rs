//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream data provider.
    pub upstream: UpstreamConfig,

    /// Upstream credentials and their per-credential rate limit.
    pub credentials: CredentialsConfig,

    /// Response cache freshness.
    pub cache: CacheConfig,

    /// Shared-secret gate in front of the proxy routes.
    pub auth: AuthConfig,

    /// Transport compression of client responses.
    pub compression: CompressionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every proxied path is joined onto.
    pub base_url: String,

    /// Query parameter carrying the credential on outbound calls.
    pub auth_param: String,

    /// Transport timeout for a single upstream call, in seconds.
    pub timeout_secs: u64,

    /// Largest upstream body the gateway will buffer.
    pub max_body_bytes: usize,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.511.org/".to_string(),
            auth_param: "api_key".to_string(),
            timeout_secs: 30,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Credential pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Credentials listed directly in the file.
    pub keys: Vec<String>,

    /// Environment prefix for numbered credentials (`<prefix>1`, `<prefix>2`, ...).
    pub env_prefix: String,

    /// Token refill rate per credential.
    pub requests_per_second: f64,

    /// Bucket capacity per credential.
    pub burst_size: u32,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            env_prefix: "FIVEONEONE_API_KEY_".to_string(),
            requests_per_second: 1.0,
            burst_size: 5,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window of a cached response, in seconds.
    pub ttl_secs: u64,

    /// Interval of the background sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 120,
            sweep_interval_secs: 600,
        }
    }
}

/// Shared-secret gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header the secret is read from.
    pub header: String,

    /// Expected secret. Empty disables the gate.
    pub secret: String,

    /// Environment variable that overrides `secret`.
    pub secret_env: String,
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: "x-gateway-secret".to_string(),
            secret: String::new(),
            secret_env: "GATEWAY_SECRET".to_string(),
        }
    }
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Gzip responses for clients that accept it.
    pub enabled: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Timeout configuration for client requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for log aggregation.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
