//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lookup_requests_total` (counter): completed requests by outcome
//! - `lookup_request_duration_seconds` (histogram): handling latency
//! - `lookup_active_connections` (gauge): connections being served
//! - `lookup_rejected_connections_total` (counter): connections dropped by the overflow policy
//! - `lookup_cache_bytes` (gauge): size of the startup content cache
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Outcome is the only label, keeping cardinality fixed

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::protocol::Outcome;

/// Install the Prometheus exporter with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: Outcome, start: Instant) {
    counter!("lookup_requests_total", "outcome" => outcome.as_str()).increment(1);
    histogram!("lookup_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_active_connections(count: u64) {
    gauge!("lookup_active_connections").set(count as f64);
}

pub fn record_rejected_connection() {
    counter!("lookup_rejected_connections_total").increment(1);
}

pub fn record_cache_size(bytes: usize) {
    gauge!("lookup_cache_bytes").set(bytes as f64);
}
