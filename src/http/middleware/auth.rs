//! Shared-secret gate.
//!
//! When a secret is configured, proxy routes require the configured header
//! to carry exactly that value. The health route is mounted outside this gate.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::http::request::request_id;

/// Header name and expected value for the gate.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    header: HeaderName,
    secret: Arc<str>,
}

impl SharedSecret {
    pub fn new(header: HeaderName, secret: impl Into<Arc<str>>) -> Self {
        Self {
            header,
            secret: secret.into(),
        }
    }

    /// `Ok(None)` when the gate is disabled (empty secret).
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>, String> {
        if !config.enabled() {
            return Ok(None);
        }
        let header = HeaderName::from_bytes(config.header.as_bytes())
            .map_err(|_| config.header.clone())?;
        Ok(Some(Self::new(header, config.secret.as_str())))
    }

    fn admits<B>(&self, request: &Request<B>) -> bool {
        request
            .headers()
            .get(&self.header)
            .is_some_and(|value| value.as_bytes() == self.secret.as_bytes())
    }
}

pub async fn require_shared_secret(
    State(gate): State<Option<SharedSecret>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate {
        Some(gate) if !gate.admits(&request) => {
            tracing::warn!(
                request_id = %request_id(&request),
                path = %request.uri().path(),
                "Rejected request without a valid shared secret"
            );
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
        _ => next.run(request).await,
    }
}
