//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): client requests by cache outcome (hit, miss, error)
//! - `gateway_collapsed_total` (counter): misses served by another caller's fetch
//! - `gateway_rate_limited_total` (counter): fetches refused for lack of credential capacity
//! - `gateway_upstream_requests_total` (counter): upstream calls by status code
//! - `gateway_upstream_errors_total` (counter): failed upstream calls by kind
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency
//! - `gateway_cache_entries` (gauge): entries held after the last sweep
//! - `gateway_cache_evictions_total` (counter): entries removed by the sweeper

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a client request and how it was served.
pub fn record_request(cache: &'static str) {
    counter!("gateway_requests_total", "cache" => cache).increment(1);
}

pub fn record_collapsed() {
    counter!("gateway_collapsed_total").increment(1);
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

/// Record a completed upstream call.
pub fn record_upstream(status: u16, started: Instant) {
    counter!("gateway_upstream_requests_total", "status" => status.to_string()).increment(1);
    histogram!("gateway_upstream_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_cache_sweep(evicted: usize, remaining: usize) {
    counter!("gateway_cache_evictions_total").increment(evicted as u64);
    gauge!("gateway_cache_entries").set(remaining as f64);
}
