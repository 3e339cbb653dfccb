//! The read path: cache, collapse, credential, upstream.

use axum::http::{StatusCode, Uri};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheKey, ResponseCache};
use crate::collapse::CollapsingFetcher;
use crate::config::GatewayConfig;
use crate::credentials::CredentialPool;
use crate::gateway::response::ClientResponse;
use crate::observability::metrics;
use crate::upstream::{FetchError, UpstreamClient, UpstreamResponse, UpstreamUrl};

type FetchOutcome = Result<UpstreamResponse, FetchError>;

/// Serves client requests from the cache or, on a miss, through one
/// collapsed upstream fetch per key.
pub struct Gateway<U> {
    pool: Arc<CredentialPool>,
    cache: Arc<ResponseCache>,
    fetcher: CollapsingFetcher<FetchOutcome>,
    url: UpstreamUrl,
    upstream: U,
}

impl<U: UpstreamClient> Gateway<U> {
    pub fn new(
        pool: Arc<CredentialPool>,
        cache: Arc<ResponseCache>,
        url: UpstreamUrl,
        upstream: U,
    ) -> Self {
        Self {
            pool,
            cache,
            fetcher: CollapsingFetcher::new(),
            url,
            upstream,
        }
    }

    /// Build every component from a validated config.
    pub fn from_config(config: &GatewayConfig, upstream: U) -> Result<Self, url::ParseError> {
        let url = UpstreamUrl::new(&config.upstream.base_url, config.upstream.auth_param.as_str())?;
        Ok(Self::new(
            Arc::new(CredentialPool::from_config(&config.credentials)),
            Arc::new(ResponseCache::from_config(&config.cache)),
            url,
            upstream,
        ))
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Handle one client request identified by its URI.
    pub async fn handle(&self, uri: &Uri) -> ClientResponse {
        let key = CacheKey::from_uri(uri, self.url.auth_param());

        if let Some(cached) = self.cache.get(key.as_str()) {
            tracing::debug!(key = %key, "Cache hit");
            metrics::record_request("hit");
            return ClientResponse::hit(cached);
        }

        let outcome = self.fetcher.run(key.as_str(), || self.fetch(&key)).await;
        if outcome.shared {
            tracing::debug!(key = %key, "Served by a collapsed fetch");
            metrics::record_collapsed();
        }

        match outcome.value {
            Ok(response) => {
                metrics::record_request("miss");
                ClientResponse::miss(response, outcome.shared)
            }
            Err(error) => {
                metrics::record_request("error");
                ClientResponse::from_error(&error)
            }
        }
    }

    /// Runs at most once per key at a time, under the collapsing fetcher.
    async fn fetch(&self, key: &CacheKey) -> FetchOutcome {
        let Some(lease) = self.pool.acquire() else {
            tracing::warn!(key = %key, credentials = self.pool.len(), "All credentials exhausted");
            metrics::record_rate_limited();
            return Err(FetchError::RateLimited);
        };

        let url = self.url.build(key.path(), key.params(), &lease.secret);
        tracing::info!(key = %key, credential = lease.index, "Fetching from upstream");

        let started = Instant::now();
        let response = match self.upstream.fetch(url).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(key = %key, credential = lease.index, error = %error, "Upstream request failed");
                metrics::record_upstream_error(error.kind());
                return Err(error);
            }
        };
        metrics::record_upstream(response.status.as_u16(), started);

        if response.status == StatusCode::OK {
            self.cache.insert(key.as_str(), response.clone());
        } else {
            tracing::debug!(key = %key, status = %response.status, "Not caching non-200 response");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::response::CacheStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use url::Url;

    const NO_REFILL: f64 = 0.0001;

    /// Counts calls, records URLs and can hold every call until released.
    struct MockUpstream {
        calls: AtomicUsize,
        urls: Mutex<Vec<Url>>,
        outcome: FetchOutcome,
        gate: Option<Arc<Notify>>,
    }

    impl MockUpstream {
        fn returning(outcome: FetchOutcome) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
                outcome,
                gate: None,
            }
        }

        fn ok(status: StatusCode, body: &'static str) -> Self {
            Self::returning(Ok(UpstreamResponse::new(status, Some("application/json"), body)))
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UpstreamClient for MockUpstream {
        async fn fetch(&self, url: Url) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcome.clone()
        }
    }

    fn gateway(keys: &[&str], burst: u32, upstream: MockUpstream) -> Gateway<MockUpstream> {
        Gateway::new(
            Arc::new(CredentialPool::new(keys.iter().copied(), NO_REFILL, burst)),
            Arc::new(ResponseCache::new(Duration::from_secs(120))),
            UpstreamUrl::new("http://api.511.org/", "api_key").unwrap(),
            upstream,
        )
    }

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let gw = gateway(&["k1"], 5, MockUpstream::ok(StatusCode::OK, r#"{"stops":[]}"#));

        let first = gw.handle(&uri("/transit/stops?format=json")).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.cache_status, Some(CacheStatus::Miss));
        assert!(!first.collapsed);
        assert_eq!(gw.upstream.calls(), 1);

        let second = gw.handle(&uri("/transit/stops?format=json")).await;
        assert_eq!(second.cache_status, Some(CacheStatus::Hit));
        assert_eq!(second.body, first.body);
        assert_eq!(second.content_type.as_deref(), Some("application/json"));
        assert_eq!(gw.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn non_200_is_relayed_but_not_cached() {
        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR, StatusCode::TOO_MANY_REQUESTS] {
            let gw = gateway(&["k1"], 5, MockUpstream::ok(status, "nope"));

            let first = gw.handle(&uri("/transit/missing")).await;
            assert_eq!(first.status, status);
            assert_eq!(first.cache_status, Some(CacheStatus::Miss));

            let second = gw.handle(&uri("/transit/missing")).await;
            assert_eq!(second.cache_status, Some(CacheStatus::Miss));
            assert_eq!(gw.upstream.calls(), 2);
            assert!(gw.cache().is_empty());
        }
    }

    #[tokio::test]
    async fn client_credential_is_replaced_and_ignored_for_caching() {
        let gw = gateway(&["pool-key"], 5, MockUpstream::ok(StatusCode::OK, "{}"));

        gw.handle(&uri("/transit/stops?api_key=forged&format=json")).await;
        let hit = gw.handle(&uri("/transit/stops?format=json&api_key=other")).await;
        assert_eq!(hit.cache_status, Some(CacheStatus::Hit));

        let urls = gw.upstream.urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        let keys: Vec<_> = urls[0]
            .query_pairs()
            .filter(|(name, _)| name == "api_key")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(keys, vec!["pool-key".to_string()]);
        assert_eq!(urls[0].path(), "/transit/stops");
    }

    #[tokio::test]
    async fn exhausted_pool_is_429_and_skips_upstream() {
        let gw = gateway(&["k1"], 1, MockUpstream::ok(StatusCode::OK, "{}"));

        gw.handle(&uri("/a")).await;
        let limited = gw.handle(&uri("/b")).await;
        assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.cache_status, None);
        assert_eq!(gw.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_502_and_not_cached() {
        let gw = gateway(
            &["k1"],
            5,
            MockUpstream::returning(Err(FetchError::Transport("connection refused".into()))),
        );

        let response = gw.handle(&uri("/transit/stops")).await;
        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert!(gw.cache().is_empty());

        gw.handle(&uri("/transit/stops")).await;
        assert_eq!(gw.upstream.calls(), 2);
    }

    #[tokio::test]
    async fn single_credential_different_keys_same_instant() {
        let gw = gateway(&["only"], 1, MockUpstream::ok(StatusCode::OK, "{}"));

        let (a_uri, b_uri) = (uri("/a"), uri("/b"));
        let (a, b) = tokio::join!(gw.handle(&a_uri), gw.handle(&b_uri));
        let mut statuses = vec![a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]);
        assert_eq!(gw.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn same_key_burst_makes_one_upstream_call() {
        let gate = Arc::new(Notify::new());
        let gw = Arc::new(gateway(
            &["only"],
            1,
            MockUpstream::ok(StatusCode::OK, "shared body").gated(gate.clone()),
        ));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let gw = gw.clone();
                tokio::spawn(async move { gw.handle(&uri("/transit/stops?format=json")).await })
            })
            .collect();

        while gw.upstream.calls() == 0 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.notify_one();

        let mut collapsed = 0;
        for handle in handles {
            let response = handle.await.unwrap();
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body, "shared body");
            assert_eq!(response.cache_status, Some(CacheStatus::Miss));
            collapsed += usize::from(response.collapsed);
        }
        assert_eq!(collapsed, 4);
        assert_eq!(gw.upstream.calls(), 1);
    }

    #[tokio::test]
    async fn exhaustion_is_not_cached_or_remembered() {
        let gw = gateway(&["only"], 1, MockUpstream::ok(StatusCode::OK, "{}"));
        gw.handle(&uri("/spent")).await;

        for _ in 0..2 {
            let response = gw.handle(&uri("/x")).await;
            assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
        }
        assert_eq!(gw.cache().len(), 1);
        assert_eq!(gw.upstream.calls(), 1);
    }
}
