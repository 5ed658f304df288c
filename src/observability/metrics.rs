//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record per-request counters and latency
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `edge_router_requests_total` (counter): handled requests by method, status
//! - `edge_router_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter it costs nothing
//! - The exporter runs its own HTTP listener, separate from the dev host

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "edge_router_requests_total";
pub const REQUEST_DURATION: &str = "edge_router_request_duration_seconds";

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!(REQUESTS_TOTAL, "method" => method.clone(), "status" => status.clone())
        .increment(1);
    ::metrics::histogram!(REQUEST_DURATION, "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}
