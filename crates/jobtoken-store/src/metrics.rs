//! Store metrics collection.
//!
//! Provides standardized metrics for monitoring store operations:
//! - Request counters by operation, table and status
//! - Latency histograms
//! - Rows returned by selects

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total store requests by operation, table and status.
    pub const REQUESTS_TOTAL: &str = "store_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "store_latency_seconds";

    /// Rows returned by select requests by table.
    pub const ROWS_RETURNED_TOTAL: &str = "store_rows_returned_total";
}

/// Record metrics for a completed store request.
pub fn record_request(operation: &str, table: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "table" => table.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record rows returned by a select.
pub fn record_rows(table: &str, rows: usize) {
    counter!(names::ROWS_RETURNED_TOTAL, "table" => table.to_string()).increment(rows as u64);
}
