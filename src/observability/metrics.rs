//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, outcome
//! - `proxy_request_duration_seconds` (histogram): latency by outcome
//! - `proxy_cache_lookups_total` (counter): hits and misses
//! - `proxy_cache_stores_total` (counter): stored vs rejected bodies
//! - `proxy_cache_size_bytes` / `proxy_cache_entries` (gauges)
//! - `proxy_cache_evictions_total` (counter)
//! - `proxy_upstream_errors_total` (counter): failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter only runs when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::cache::CacheStats;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_store(stored: bool) {
    let result = if stored { "stored" } else { "rejected" };
    counter!("proxy_cache_stores_total", "result" => result).increment(1);
}

/// Publish the cache's current counters.
pub fn record_cache_stats(stats: &CacheStats) {
    gauge!("proxy_cache_size_bytes").set(stats.size_bytes as f64);
    gauge!("proxy_cache_entries").set(stats.entries as f64);
    counter!("proxy_cache_evictions_total").absolute(stats.evictions);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
