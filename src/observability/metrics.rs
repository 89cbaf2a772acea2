//! Metrics collection and exposition.
//!
//! # Metrics
//! - `receiver_requests_total` (counter): callbacks by method and status
//! - `receiver_request_duration_seconds` (histogram): end-to-end latency
//! - `receiver_rejections_total` (counter): failed verifications by stage
//! - `receiver_handler_errors_total` (counter): handler or key failures
//!
//! Updates go through the `metrics` facade and cost nothing until a
//! recorder is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve scrapes on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

/// Record one finished callback.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();

    metrics::counter!("receiver_requests_total", "method" => method.clone(), "status" => status).increment(1);
    metrics::histogram!("receiver_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request that failed verification at `stage` (`challenge` or `message`).
pub fn record_rejection(stage: &'static str) {
    metrics::counter!("receiver_rejections_total", "stage" => stage).increment(1);
}

/// Record a callback that failed after verification.
pub fn record_handler_error(kind: &'static str) {
    metrics::counter!("receiver_handler_errors_total", "kind" => kind).increment(1);
}
