//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_active_connections` (gauge): currently tracked connections
//! - `server_connections_total` (counter): accepted connections
//! - `server_shutdowns_total` (counter): shutdowns by outcome
//! - `server_shutdown_duration_seconds` (histogram): time spent draining
//!
//! # Design Decisions
//! - Updates go through the `metrics` facade and are no-ops until a recorder is installed
//! - Prometheus exposition is opt-in from the binary

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn connection_opened() {
    metrics::counter!("server_connections_total").increment(1);
    metrics::gauge!("server_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("server_active_connections").decrement(1.0);
}

/// Record a finished shutdown. `outcome` is `ok`, `timeout` or `error`.
pub fn record_shutdown(outcome: &'static str, started: Instant) {
    metrics::counter!("server_shutdowns_total", "outcome" => outcome).increment(1);
    metrics::histogram!("server_shutdown_duration_seconds").record(started.elapsed().as_secs_f64());
}
