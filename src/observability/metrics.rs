//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status
//! - `api_request_duration_seconds` (histogram): latency by method
//! - `api_log_write_failures_total` (counter): swallowed channel failures
//! - `diagnostics_probe_total` (counter): probe runs by probe, outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("api_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_log_write_failure() {
    counter!("api_log_write_failures_total").increment(1);
}

pub fn record_probe(probe: &'static str, completed: bool) {
    let outcome = if completed { "completed" } else { "failed" };
    counter!("diagnostics_probe_total", "probe" => probe, "outcome" => outcome).increment(1);
}
