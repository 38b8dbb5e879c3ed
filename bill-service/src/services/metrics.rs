//! Prometheus export for bill-service.
//!
//! The recorder is installed once at startup; `/metrics` renders it.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub const BILLS_CREATED: &str = "bills_created_total";
pub const BILLS_UPDATED: &str = "bills_updated_total";
pub const BILLS_DELETED: &str = "bills_deleted_total";
pub const VALIDATION_FAILURES: &str = "bill_validation_failures_total";
pub const RECEIPT_RENDER_DURATION: &str = "receipt_render_duration_seconds";

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder.
///
/// Panics if a recorder is already installed.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    describe_counter!(BILLS_CREATED, "Bills persisted through the API");
    describe_counter!(BILLS_UPDATED, "Bills replaced through the API");
    describe_counter!(BILLS_DELETED, "Bills deleted through the API");
    describe_counter!(
        VALIDATION_FAILURES,
        "Create or update requests rejected by input validation"
    );
    describe_histogram!(
        RECEIPT_RENDER_DURATION,
        Unit::Seconds,
        "Time spent generating PDF receipts"
    );
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}
