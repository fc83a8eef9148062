//! Metrics collection and exposition.
//!
//! # Metrics
//! - `errorpages_responses_total` (counter): error pages served, by status
//! - `errorpages_panics_total` (counter): panics recovered by the middleware
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-ops until an exporter is installed
//! - Prometheus exporter is optional and off by default

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count an error page served for `status`.
pub fn record_error_page(status: u16) {
    ::metrics::counter!("errorpages_responses_total", "status" => status.to_string()).increment(1);
}

/// Count a panic recovered while handling a request.
pub fn record_panic() {
    ::metrics::counter!("errorpages_panics_total").increment(1);
}
