//! Metrics collection and exposition.
//!
//! # Metrics
//! - `verifier_runs_total` (counter): runs by outcome
//! - `verifier_poll_attempts_total` (counter): trace poll attempts
//! - `verifier_probe_duration_seconds` (histogram): gateway probe latency
//!
//! # Design Decisions
//! - Prometheus exporter only when an address is configured

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_poll_attempt() {
    ::metrics::counter!("verifier_poll_attempts_total").increment(1);
}

pub fn record_probe(duration: Duration, passed: bool) {
    ::metrics::histogram!(
        "verifier_probe_duration_seconds",
        "passed" => if passed { "true" } else { "false" }
    )
    .record(duration.as_secs_f64());
}

pub fn record_run(outcome: &'static str) {
    ::metrics::counter!("verifier_runs_total", "outcome" => outcome).increment(1);
}
