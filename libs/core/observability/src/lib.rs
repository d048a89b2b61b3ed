//! Observability utilities for the IPv4 cost scanner.
//!
//! This crate provides:
//! - Prometheus metrics recording and text exposition
//! - Scan metrics (region fetches, category totals, scan outcomes)
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, ScanMetrics};
//!
//! init_metrics()?;
//!
//! ScanMetrics::record_scan(true, started.elapsed());
//!
//! eprintln!("{}", render_metrics());
//! ```

pub mod scan;

pub use scan::ScanMetrics;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to install Prometheus recorder: {0}")]
    Install(#[from] BuildError),
}

/// Initialize the Prometheus metrics recorder.
///
/// Installs the global recorder on first call; later calls return the same
/// handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, MetricsError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition of everything recorded so far
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Region fetch metrics
    describe_counter!(
        "ipv4_region_fetches_total",
        "Regional inventory fetches by category and status"
    );
    describe_histogram!(
        "ipv4_region_fetch_duration_seconds",
        "Regional inventory fetch duration in seconds"
    );

    // Category metrics
    describe_gauge!(
        "ipv4_category_addresses",
        "Billable public IPv4 addresses found in the last scan by category"
    );
    describe_gauge!(
        "ipv4_category_monthly_cost_usd",
        "Monthly public IPv4 cost found in the last scan by category"
    );
    describe_counter!(
        "ipv4_category_failures_total",
        "Regional or per-record failures recorded by category"
    );
    describe_histogram!(
        "ipv4_category_duration_seconds",
        "Time to gather one category across every region"
    );

    // Scan metrics
    describe_counter!("ipv4_scans_total", "Scans by outcome");
    describe_histogram!("ipv4_scan_duration_seconds", "Scan duration in seconds");
}
