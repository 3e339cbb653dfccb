//! Client-facing response shape.

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::upstream::{FetchError, UpstreamResponse};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_COLLAPSED: HeaderName = HeaderName::from_static("x-collapsed");

pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded for all API keys";
pub const UPSTREAM_ERROR_MESSAGE: &str = "External API Error";

/// Whether a response was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// What the gateway hands back for one client request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
    /// `None` for error outcomes, which carry no cache header.
    pub cache_status: Option<CacheStatus>,
    /// Set on misses served by another caller's upstream fetch.
    pub collapsed: bool,
}

impl ClientResponse {
    pub fn hit(response: UpstreamResponse) -> Self {
        Self::from_upstream(response, CacheStatus::Hit, false)
    }

    pub fn miss(response: UpstreamResponse, collapsed: bool) -> Self {
        Self::from_upstream(response, CacheStatus::Miss, collapsed)
    }

    fn from_upstream(response: UpstreamResponse, cache_status: CacheStatus, collapsed: bool) -> Self {
        Self {
            status: response.status,
            content_type: response.content_type,
            body: response.body,
            cache_status: Some(cache_status),
            collapsed,
        }
    }

    /// 429 when no credential had capacity, 502 for anything else.
    pub fn from_error(error: &FetchError) -> Self {
        let (status, message) = match error {
            FetchError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE),
            _ => (StatusCode::BAD_GATEWAY, UPSTREAM_ERROR_MESSAGE),
        };
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: Bytes::from_static(message.as_bytes()),
            cache_status: None,
            collapsed: false,
        }
    }
}

impl IntoResponse for ClientResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();

        // Upstream bytes are relayed untyped unless a valid type was recorded.
        headers.remove(header::CONTENT_TYPE);
        if let Some(value) = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            headers.insert(header::CONTENT_TYPE, value);
        }

        if let Some(cache_status) = self.cache_status {
            headers.insert(X_CACHE, HeaderValue::from_static(cache_status.as_str()));
        }
        if self.collapsed {
            headers.insert(X_COLLAPSED, HeaderValue::from_static("TRUE"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn collapsed_miss_carries_both_headers() {
        let upstream = UpstreamResponse::new(StatusCode::OK, Some("application/json"), "[]");
        let response = ClientResponse::miss(upstream, true).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_CACHE], "MISS");
        assert_eq!(response.headers()[X_COLLAPSED], "TRUE");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn hit_without_content_type_sends_none() {
        let upstream = UpstreamResponse::new(StatusCode::OK, None, "raw");
        let response = ClientResponse::hit(upstream).into_response();

        assert_eq!(response.headers()[X_CACHE], "HIT");
        assert!(response.headers().get(X_COLLAPSED).is_none());
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn errors_map_to_distinct_statuses_without_cache_header() {
        let limited = ClientResponse::from_error(&FetchError::RateLimited);
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.body, RATE_LIMITED_MESSAGE);

        for error in [
            FetchError::Transport("refused".into()),
            FetchError::Timeout(Duration::from_secs(30)),
            FetchError::Body("truncated".into()),
        ] {
            let response = ClientResponse::from_error(&error);
            assert_eq!(response.status, StatusCode::BAD_GATEWAY);
            assert_eq!(response.body, UPSTREAM_ERROR_MESSAGE);
            assert!(response.into_response().headers().get(X_CACHE).is_none());
        }
    }
}
