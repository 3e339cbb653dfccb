//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/up` liveness plus the proxy routes
//! - Wire up middleware (request ID, tracing, timeout, compression, shared secret)
//! - Build the gateway components from config
//! - Run the cache sweeper alongside the listener
//! - Stop accepting and drain on the shutdown broadcast

use axum::{
    extract::State,
    http::Uri,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::{CacheSweeper, ResponseCache};
use crate::config::GatewayConfig;
use crate::gateway::{ClientResponse, Gateway};
use crate::http::middleware::{require_shared_secret, SharedSecret};
use crate::http::request::{make_span, MakeRequestUuidV4, X_REQUEST_ID};
use crate::upstream::HttpUpstream;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream base URL: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("invalid auth header name {0:?}")]
    AuthHeader(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway<HttpUpstream>>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    cache: Arc<ResponseCache>,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let upstream = HttpUpstream::from_config(&config.upstream);
        let gateway = Arc::new(Gateway::from_config(&config, upstream)?);
        let cache = gateway.cache().clone();
        let gate = SharedSecret::from_config(&config.auth).map_err(ServerError::AuthHeader)?;

        tracing::info!(
            upstream = %config.upstream.base_url,
            credentials = gateway.pool().len(),
            shared_secret = gate.is_some(),
            compression = config.compression.enabled,
            "Gateway initialized"
        );

        let router = Self::build_router(&config, AppState { gateway }, gate);
        Ok(Self {
            router,
            config,
            cache,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, gate: Option<SharedSecret>) -> Router {
        let mut proxy = Router::new()
            .route("/", get(proxy_handler))
            .route("/{*path}", get(proxy_handler))
            .route_layer(middleware::from_fn_with_state(gate, require_shared_secret))
            .with_state(state);
        if config.compression.enabled {
            proxy = proxy.layer(CompressionLayer::new());
        }

        Router::new()
            .route("/up", get(health_handler))
            .merge(proxy)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = CacheSweeper::new(self.cache.clone(), self.config.cache.sweep_interval());
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness probe. Bypasses the shared secret and compression.
async fn health_handler() -> &'static str {
    "OK"
}

async fn proxy_handler(State(state): State<AppState>, uri: Uri) -> ClientResponse {
    state.gateway.handle(&uri).await
}
