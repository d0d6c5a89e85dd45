//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transfer_submissions_total` (counter): submissions by outcome
//! - `transfer_pending` (gauge): 1 while a submission awaits confirmation
//! - `transfer_transaction_count` (gauge): last contract counter value
//! - `transfer_history_size` (gauge): records in the last history fetch
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Outcome labels are static strings to keep cardinality bounded

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished submission.
pub fn record_submission(outcome: &'static str) {
    metrics::counter!("transfer_submissions_total", "outcome" => outcome).increment(1);
}

/// Flag whether a submission is awaiting confirmation.
pub fn record_pending(pending: bool) {
    metrics::gauge!("transfer_pending").set(if pending { 1.0 } else { 0.0 });
}

/// Record the contract's transfer counter.
pub fn record_transaction_count(count: u64) {
    metrics::gauge!("transfer_transaction_count").set(count as f64);
}

/// Record how many records the last history fetch returned.
pub fn record_history_size(size: usize) {
    metrics::gauge!("transfer_history_size").set(size as f64);
}
