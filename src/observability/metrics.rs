//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alias_requests_total` (counter): requests by method and status
//! - `alias_request_duration_seconds` (histogram): latency distribution
//! - `alias_resolutions_total` (counter): resolutions by direction, memo hit/miss
//! - `alias_redirects_total` (counter): canonical redirects issued
//! - `alias_bindings` (gauge): bindings in the published table
//! - `alias_store_flushes_total` (counter): cache write-backs by result
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Direction;

/// Install the Prometheus recorder and start its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "alias_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("alias_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(direction: Direction, memo_hit: bool) {
    let outcome = if memo_hit { "hit" } else { "miss" };
    counter!(
        "alias_resolutions_total",
        "direction" => direction.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_redirect() {
    counter!("alias_redirects_total").increment(1);
}

pub fn record_bindings(count: usize) {
    gauge!("alias_bindings").set(count as f64);
}

pub fn record_store_flush(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("alias_store_flushes_total", "result" => result).increment(1);
}
