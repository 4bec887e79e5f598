//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registration_requests_total` (counter): submissions by outcome
//! - `registration_rate_limited_total` (counter): rejected by the rate limiter
//! - `sheets_errors_total` (counter): Google Sheets failures by kind
//! - `sheets_append_duration_seconds` (histogram): append latency
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome label for a registration submission.
pub fn record_registration(outcome: &'static str) {
    counter!("registration_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited() {
    counter!("registration_rate_limited_total").increment(1);
}

pub fn record_sheet_error(kind: &'static str) {
    counter!("sheets_errors_total", "kind" => kind).increment(1);
}

pub fn record_append_duration(started: Instant) {
    histogram!("sheets_append_duration_seconds").record(started.elapsed().as_secs_f64());
}
