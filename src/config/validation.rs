//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, intervals and timeouts > 0, addresses parse)
//! - Refuse to start without at least one upstream credential
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no upstream credentials configured (set credentials.keys or {0}1, {0}2, ...)")]
    NoCredentials(String),

    #[error("credentials.requests_per_second must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("credentials.burst_size must be at least 1")]
    ZeroBurst,

    #[error("cache.ttl_secs must be greater than zero")]
    ZeroTtl,

    #[error("cache.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("upstream.base_url {0:?} is not an absolute http URL")]
    InvalidBaseUrl(String),

    #[error("upstream.auth_param must not be empty")]
    EmptyAuthParam,

    #[error("upstream.timeout_secs must be greater than zero")]
    ZeroUpstreamTimeout,

    #[error("upstream.max_body_bytes must be greater than zero")]
    ZeroMaxBodyBytes,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate a fully assembled configuration (file + environment).
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.credentials.keys.is_empty() {
        errors.push(ValidationError::NoCredentials(
            config.credentials.env_prefix.clone(),
        ));
    }

    let rate = config.credentials.requests_per_second;
    if !rate.is_finite() || rate <= 0.0 {
        errors.push(ValidationError::InvalidRate(rate));
    }

    if config.credentials.burst_size == 0 {
        errors.push(ValidationError::ZeroBurst);
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::ZeroTtl);
    }

    if config.cache.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.scheme() == "http" && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(
            config.upstream.base_url.clone(),
        )),
    }

    if config.upstream.auth_param.is_empty() {
        errors.push(ValidationError::EmptyAuthParam);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }

    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroMaxBodyBytes);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
