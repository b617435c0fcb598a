//! Metrics collection and exposition.
//!
//! # Metrics
//! - `detect_requests_total` (counter): requests by status and result source
//! - `detect_request_duration_seconds` (histogram): end-to-end latency
//! - `detect_cache_lookups_total` (counter): hits and misses
//! - `detect_cache_entries` (gauge): current cache size
//! - `detect_rate_limited_total` (counter): requests rejected with 429
//! - `detect_guard_decisions_total` (counter): guard outcomes by mode
//! - `detect_provider_calls_total` (counter): provider outcomes
//! - `detect_provider_duration_seconds` (histogram): provider latency
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(status: u16, source: &str, start: Instant) {
    counter!(
        "detect_requests_total",
        "status" => status.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
    histogram!("detect_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("detect_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("detect_cache_entries").set(entries as f64);
}

pub fn record_rate_limited() {
    counter!("detect_rate_limited_total").increment(1);
}

pub fn record_guard_decision(mode: &'static str, allowed: bool) {
    let decision = if allowed { "allow" } else { "deny" };
    counter!("detect_guard_decisions_total", "mode" => mode, "decision" => decision).increment(1);
}

pub fn record_provider_call(outcome: &'static str, start: Instant) {
    counter!("detect_provider_calls_total", "outcome" => outcome).increment(1);
    histogram!("detect_provider_duration_seconds").record(start.elapsed().as_secs_f64());
}
