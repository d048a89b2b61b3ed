//! Scan metrics for the public IPv4 cost scanner.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Scan metrics recorder
pub struct ScanMetrics;

impl ScanMetrics {
    // =========================================================================
    // Region Metrics
    // =========================================================================

    /// Record one regional listing of a category
    pub fn record_region_fetch(category: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "failure" };

        counter!(
            "ipv4_region_fetches_total",
            "category" => category.to_string(),
            "status" => status
        )
        .increment(1);
        histogram!("ipv4_region_fetch_duration_seconds", "category" => category.to_string())
            .record(duration.as_secs_f64());
    }

    // =========================================================================
    // Category Metrics
    // =========================================================================

    /// Record the merged result of one category
    pub fn record_category(
        category: &str,
        addresses: usize,
        monthly_cost: f64,
        failures: usize,
        duration: Duration,
    ) {
        gauge!("ipv4_category_addresses", "category" => category.to_string()).set(addresses as f64);
        gauge!("ipv4_category_monthly_cost_usd", "category" => category.to_string())
            .set(monthly_cost);
        counter!("ipv4_category_failures_total", "category" => category.to_string())
            .increment(failures as u64);
        histogram!("ipv4_category_duration_seconds", "category" => category.to_string())
            .record(duration.as_secs_f64());

        tracing::debug!(
            category = category,
            addresses = addresses,
            monthly_cost = monthly_cost,
            failures = failures,
            "Recorded category metrics"
        );
    }

    // =========================================================================
    // Scan Metrics
    // =========================================================================

    /// Record a finished scan
    pub fn record_scan(success: bool, duration: Duration) {
        let status = if success { "completed" } else { "aborted" };

        counter!("ipv4_scans_total", "status" => status).increment(1);
        histogram!("ipv4_scan_duration_seconds").record(duration.as_secs_f64());
    }
}
