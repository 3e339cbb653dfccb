//! Upstream transport.

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::future::Future;
use std::time::Duration;
use tokio::time;
use url::Url;

use crate::config::UpstreamConfig;

/// A fully read upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
        }
    }
}

/// Why an upstream fetch produced no response.
///
/// `Clone` so one outcome can be handed to every collapsed waiter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// No credential had rate-limit capacity.
    #[error("rate limit exceeded for all credentials")]
    RateLimited,

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream body: {0}")]
    Body(String),
}

impl FetchError {
    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::RateLimited => "rate_limited",
            FetchError::Transport(_) => "transport",
            FetchError::Timeout(_) => "timeout",
            FetchError::Body(_) => "body",
        }
    }
}

/// Issues a GET against the upstream and reads the whole response.
pub trait UpstreamClient: Send + Sync + 'static {
    fn fetch(&self, url: Url) -> impl Future<Output = Result<UpstreamResponse, FetchError>> + Send;
}

/// HTTP/1.1 upstream client built on the hyper-util legacy client.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpUpstream {
    pub fn new(timeout: Duration, max_body_bytes: usize) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            timeout,
            max_body_bytes,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.timeout(), config.max_body_bytes)
    }

    async fn send(&self, url: Url) -> Result<UpstreamResponse, FetchError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(header::USER_AGENT, concat!("caltrain-gateway/", env!("CARGO_PKG_VERSION")))
            .body(Body::empty())
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes)
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, url: Url) -> Result<UpstreamResponse, FetchError> {
        match time::timeout(self.timeout, self.send(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}
