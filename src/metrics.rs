// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for zonekeeper.
//!
//! All metrics use the namespace prefix `zonekeeper_`. zonekeeper is a
//! short-lived CLI, so metrics are not served over HTTP; they are written in
//! text exposition format to a file picked up by node-exporter's textfile
//! collector (`--metrics-file`).
//!
//! # Metrics Categories
//!
//! - **Run Metrics** - Operations run and their outcomes
//! - **Deploy Metrics** - Zone deployments and name server reloads
//! - **Backup Metrics** - Archives written and pruned
//! - **Monitor Metrics** - Health checks and query latency
//! - **Zone Metrics** - Serial and record count of the last generated zone
//!
//! # Example
//!
//! ```rust,no_run
//! use zonekeeper::metrics::{gather_metrics, record_backup};
//!
//! record_backup("zones", true);
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("zonekeeper_backups_total"));
//! ```

use anyhow::{Context, Result};
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all zonekeeper metrics
const METRICS_NAMESPACE: &str = "zonekeeper";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Run Metrics
// ============================================================================

/// Total number of runs by operation and status
///
/// Labels:
/// - `operation`: `generate`, `deploy`, `backup`, `monitor`
/// - `status`: `success`, `error`
pub static RUNS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_runs_total"),
        "Total number of runs by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of runs in seconds
///
/// Labels:
/// - `operation`: `generate`, `deploy`, `backup`, `monitor`
pub static RUN_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_run_duration_seconds"),
        "Duration of runs in seconds by operation",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Deploy Metrics
// ============================================================================

/// Total number of deployments by outcome
///
/// Labels:
/// - `outcome`: `deployed`, `dry_run`, `failed`
pub static DEPLOYS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_deploys_total"),
        "Total number of zone deployments by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of name server reloads by status
///
/// Labels:
/// - `status`: `success`, `error`
pub static RELOADS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reloads_total"),
        "Total number of name server reloads by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Backup Metrics
// ============================================================================

/// Total number of backup archives by category and status
///
/// Labels:
/// - `category`: `zones`, `config`
/// - `status`: `success`, `error`
pub static BACKUPS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_backups_total"),
        "Total number of backup archives by category and status",
    );
    let counter = CounterVec::new(opts, &["category", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of archives removed by retention
///
/// Labels:
/// - `category`: `zones`, `config`
pub static BACKUPS_PRUNED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_backups_pruned_total"),
        "Total number of backup archives removed by retention",
    );
    let counter = CounterVec::new(opts, &["category"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Monitor Metrics
// ============================================================================

/// Total number of monitor checks by check and status
///
/// Labels:
/// - `check`: `forward`, `reverse`, `latency`
/// - `status`: `pass`, `warn`, `fail`
pub static MONITOR_CHECKS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_monitor_checks_total"),
        "Total number of monitor checks by check and status",
    );
    let counter = CounterVec::new(opts, &["check", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Latency of timed DNS queries in seconds
///
/// Labels:
/// - `record_type`: Query type (e.g., `A`)
pub static DNS_QUERY_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_dns_query_duration_seconds"),
        "Latency of timed DNS queries in seconds",
    )
    .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 3.0]);
    let histogram = HistogramVec::new(opts, &["record_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Zone Metrics
// ============================================================================

/// SOA serial of the last generated zone
///
/// Labels:
/// - `zone`: Zone origin
pub static ZONE_SERIAL: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_serial"),
        "SOA serial of the last generated zone",
    );
    let gauge = GaugeVec::new(opts, &["zone"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Number of host records in the last generated zone
///
/// Labels:
/// - `zone`: Zone origin
pub static ZONE_RECORDS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_zone_records"),
        "Number of host records in the last generated zone",
    );
    let gauge = GaugeVec::new(opts, &["zone"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Record a finished run
///
/// # Arguments
/// * `operation` - The operation run (e.g., `deploy`)
/// * `success` - Whether the run succeeded
/// * `duration` - Wall-clock duration of the run
pub fn record_run(operation: &str, success: bool, duration: Duration) {
    RUNS_TOTAL
        .with_label_values(&[operation, status_label(success)])
        .inc();
    RUN_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a deployment outcome (`deployed`, `dry_run`, `failed`)
pub fn record_deploy(outcome: &str) {
    DEPLOYS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record a name server reload attempt
pub fn record_reload(success: bool) {
    RELOADS_TOTAL
        .with_label_values(&[status_label(success)])
        .inc();
}

/// Record a backup attempt
///
/// # Arguments
/// * `category` - Backup category (`zones`, `config`)
/// * `success` - Whether a verified archive was produced
pub fn record_backup(category: &str, success: bool) {
    BACKUPS_TOTAL
        .with_label_values(&[category, status_label(success)])
        .inc();
}

/// Record archives removed by retention
pub fn record_backups_pruned(category: &str, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    BACKUPS_PRUNED_TOTAL
        .with_label_values(&[category])
        .inc_by(count as f64);
}

/// Record one monitor check result
///
/// # Arguments
/// * `check` - `forward`, `reverse` or `latency`
/// * `status` - `pass`, `warn` or `fail`
pub fn record_monitor_check(check: &str, status: &str) {
    MONITOR_CHECKS_TOTAL
        .with_label_values(&[check, status])
        .inc();
}

/// Record the latency of a timed DNS query
pub fn record_query_latency(record_type: &str, latency: Duration) {
    DNS_QUERY_DURATION_SECONDS
        .with_label_values(&[record_type])
        .observe(latency.as_secs_f64());
}

/// Record the serial and size of a generated zone
pub fn record_zone(zone: &str, serial: u32, records: usize) {
    ZONE_SERIAL
        .with_label_values(&[zone])
        .set(f64::from(serial));
    #[allow(clippy::cast_precision_loss)]
    ZONE_RECORDS
        .with_label_values(&[zone])
        .set(records as f64);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

/// Write all metrics to `path` for the node-exporter textfile collector.
///
/// The file is written beside its destination and renamed into place so the
/// collector never scrapes a partial file.
///
/// # Errors
/// Returns error if encoding or writing fails
pub fn write_textfile(path: &Path) -> Result<()> {
    let text = gather_metrics().context("Failed to encode metrics")?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create metrics directory {}", dir.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create metrics file in {}", dir.display()))?;
    std::io::Write::write_all(&mut file, text.as_bytes())
        .context("Failed to write metrics")?;
    file.persist(path)
        .with_context(|| format!("Failed to write metrics file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
