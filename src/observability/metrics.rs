//! Metrics collection and exposition.
//!
//! # Metrics
//! - `matrix_connections_accepted_total` (counter)
//! - `matrix_active_connections` (gauge): outstanding handlers
//! - `matrix_accept_errors_total` (counter): by `kind` (transient, fatal)
//! - `matrix_handler_errors_total` (counter)
//! - `matrix_http_requests_total` (counter): by `method`
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_accepted() {
    metrics::counter!("matrix_connections_accepted_total").increment(1);
    metrics::gauge!("matrix_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("matrix_active_connections").decrement(1.0);
}

pub fn record_accept_error(kind: &'static str) {
    metrics::counter!("matrix_accept_errors_total", "kind" => kind).increment(1);
}

pub fn record_handler_error() {
    metrics::counter!("matrix_handler_errors_total").increment(1);
}

pub fn record_http_request(method: &str) {
    metrics::counter!("matrix_http_requests_total", "method" => method.to_string()).increment(1);
}
