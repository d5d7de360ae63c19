//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rr_proxy_requests_total` (counter): requests by method, status, backend
//! - `rr_proxy_request_duration_seconds` (histogram): latency distribution
//! - `rr_proxy_backend_alive` (gauge): 1=alive, 0=dead, per backend
//! - `rr_proxy_forward_failures_total` (counter): by backend and kind
//! - `rr_proxy_retries_total` (counter): extra dispatch attempts
//! - `rr_proxy_unavailable_total` (counter): requests answered with 503

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    metrics::counter!(
        "rr_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "rr_proxy_request_duration_seconds",
        "method" => method.to_string(),
        "backend" => backend.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, alive: bool) {
    metrics::gauge!("rr_proxy_backend_alive", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}

pub fn record_forward_failure(backend: &str, kind: &'static str) {
    metrics::counter!(
        "rr_proxy_forward_failures_total",
        "backend" => backend.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_retry() {
    metrics::counter!("rr_proxy_retries_total").increment(1);
}

pub fn record_unavailable() {
    metrics::counter!("rr_proxy_unavailable_total").increment(1);
}
