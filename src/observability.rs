//! Prometheus recorder for the run counters.
//!
//! A batch run has no scrape endpoint, so the rendered exposition text is
//! written next to the logs when the run ends.

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::error::{Result, ScraperError};

pub const HTTP_REQUESTS_TOTAL: &str = "popair_http_requests_total";
pub const RATE_LIMITED_TOTAL: &str = "popair_rate_limited_total";
pub const ROWS_REMOVED_TOTAL: &str = "popair_rows_removed_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Register help text for every counter the crate records.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Requests sent to the air-quality API");
    describe_counter!(RATE_LIMITED_TOTAL, "Responses answered with HTTP 429");
    describe_counter!(
        ROWS_REMOVED_TOTAL,
        "Joined rows dropped for negative or non-numeric pollution values"
    );
}

/// Install the global recorder once and return its handle.
pub fn install_recorder() -> Result<&'static PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle);
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ScraperError::Metrics(format!("failed to install recorder: {}", e)))?;
    describe_metrics();
    Ok(METRICS_HANDLE.get_or_init(|| handle))
}

/// Write the current exposition text to `path`, creating parent directories.
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, handle.render())?;
    info!("Metrics snapshot written to {}", path.display());
    Ok(())
}
