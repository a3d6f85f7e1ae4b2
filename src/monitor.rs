// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Health checks of deployed zones against a live resolver.
//!
//! The deployed forward zone is the source of truth. For every A record in it
//! the monitor runs three independent checks against the resolver:
//!
//! - **forward**: an A query must return exactly the expected address
//! - **reverse**: a PTR query for the expected address must return exactly
//!   `host.origin.`
//! - **latency**: a separately timed A query must answer within the threshold
//!
//! A failing or erroring check only affects its own host; the run always
//! covers every host.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::bind9::Resolver;
use crate::constants::ZONE_FILE_PREFIX;
use crate::errors::MonitorError;
use crate::metrics;
use crate::report::Report;
use crate::zone::{extract_a_records, extract_origin, DeployedHost};

/// Result of one check. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of monitoring one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringResult {
    /// Fully qualified host name (`web.devops.lab.`)
    pub host: String,
    pub expected_ip: Ipv4Addr,
    /// Addresses returned by the forward query (empty on error)
    pub observed_forward: Vec<Ipv4Addr>,
    /// Names returned by the reverse query (empty on error)
    pub observed_reverse: Vec<String>,
    /// Round trip of the timed query, if it answered
    pub latency_ms: Option<u64>,
    pub forward: CheckStatus,
    pub reverse: CheckStatus,
    pub latency: CheckStatus,
    /// Worst of the three checks
    pub status: CheckStatus,
}

/// All results of a monitoring run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub origin: String,
    pub results: Vec<MonitoringResult>,
}

impl MonitorSummary {
    /// Number of hosts whose overall status is `status`.
    #[must_use]
    pub fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// True if any check of any host failed. Warnings do not count.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.count(CheckStatus::Fail) > 0
    }
}

/// Fully qualified name of a zone owner relative to `origin`.
#[must_use]
pub fn host_fqdn(owner: &str, origin: &str) -> String {
    if owner == "@" {
        format!("{origin}.")
    } else if owner.ends_with('.') {
        owner.to_string()
    } else {
        format!("{owner}.{origin}.")
    }
}

/// Read the deployed forward zone and work out its origin.
///
/// The origin is, in order of preference: `origin` if given, the zone's
/// `$ORIGIN` directive, or the file name with its `db.` prefix removed.
///
/// # Errors
///
/// Returns [`MonitorError::ZoneUnreadable`] if the file cannot be read and
/// [`MonitorError::UnknownOrigin`] if no origin can be determined.
pub fn load_deployed_zone(path: &Path, origin: Option<&str>) -> Result<(String, String), MonitorError> {
    let text = std::fs::read_to_string(path).map_err(|source| MonitorError::ZoneUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let origin = origin
        .map(|o| o.trim().trim_end_matches('.').to_string())
        .filter(|o| !o.is_empty())
        .or_else(|| extract_origin(&text))
        .or_else(|| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(ZONE_FILE_PREFIX))
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
        .ok_or_else(|| MonitorError::UnknownOrigin {
            path: path.to_path_buf(),
        })?;

    Ok((origin, text))
}

fn format_addresses(addresses: &[Ipv4Addr]) -> String {
    if addresses.is_empty() {
        return "no answer".to_string();
    }
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "no answer".to_string()
    } else {
        names.join(", ")
    }
}

fn record(report: &mut Report, status: CheckStatus, message: String) {
    match status {
        CheckStatus::Pass => report.pass(message),
        CheckStatus::Warn => report.warn(message),
        CheckStatus::Fail => report.fail(message),
    }
}

/// Run the forward, reverse and latency checks for one host.
pub async fn check_host(
    resolver: &dyn Resolver,
    host: &DeployedHost,
    origin: &str,
    latency_threshold: Duration,
    report: &mut Report,
) -> MonitoringResult {
    let fqdn = host_fqdn(&host.hostname, origin);
    let expected_ip = host.expected_ip;

    // forward
    let (forward, observed_forward) = match resolver.lookup_a(&fqdn).await {
        Ok(addresses) => {
            let status = if addresses == [expected_ip] {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            };
            record(
                report,
                status,
                format!(
                    "{fqdn} forward: expected {expected_ip}, got {}",
                    format_addresses(&addresses)
                ),
            );
            (status, addresses)
        }
        Err(e) => {
            report.fail(format!("{fqdn} forward: query failed: {e}"));
            (CheckStatus::Fail, Vec::new())
        }
    };

    // reverse
    let (reverse, observed_reverse) = match resolver.lookup_ptr(expected_ip).await {
        Ok(names) => {
            let status = match names.as_slice() {
                [name] if name.eq_ignore_ascii_case(&fqdn) => CheckStatus::Pass,
                _ => CheckStatus::Fail,
            };
            record(
                report,
                status,
                format!(
                    "{fqdn} reverse: {expected_ip} expected {fqdn}, got {}",
                    format_names(&names)
                ),
            );
            (status, names)
        }
        Err(e) => {
            report.fail(format!("{fqdn} reverse: query failed: {e}"));
            (CheckStatus::Fail, Vec::new())
        }
    };

    // latency
    let started = Instant::now();
    let timed = resolver.lookup_a(&fqdn).await;
    let elapsed = started.elapsed();
    let (latency, latency_ms) = match timed {
        Ok(_) => {
            metrics::record_query_latency("A", elapsed);
            let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            let status = if elapsed > latency_threshold {
                CheckStatus::Warn
            } else {
                CheckStatus::Pass
            };
            record(
                report,
                status,
                format!(
                    "{fqdn} latency: {ms}ms (threshold {}ms)",
                    latency_threshold.as_millis()
                ),
            );
            (status, Some(ms))
        }
        Err(e) => {
            report.fail(format!("{fqdn} latency: query failed: {e}"));
            (CheckStatus::Fail, None)
        }
    };

    for (check, status) in [("forward", forward), ("reverse", reverse), ("latency", latency)] {
        metrics::record_monitor_check(check, status.as_str());
    }

    let status = forward.max(reverse).max(latency);
    debug!(host = %fqdn, status = %status, "Host checked");

    MonitoringResult {
        host: fqdn,
        expected_ip,
        observed_forward,
        observed_reverse,
        latency_ms,
        forward,
        reverse,
        latency,
        status,
    }
}

/// Check every A record of `zone_text` against `resolver`.
///
/// Hosts are checked one at a time, in zone order.
pub async fn run_monitor(
    resolver: &dyn Resolver,
    zone_text: &str,
    origin: &str,
    latency_threshold: Duration,
    report: &mut Report,
) -> MonitorSummary {
    let hosts = extract_a_records(zone_text);
    if hosts.is_empty() {
        report.warn(format!("Zone {origin} has no A records to monitor"));
    } else {
        report.info(format!(
            "Monitoring {} host(s) of {origin} against {}",
            hosts.len(),
            resolver.server()
        ));
    }

    let mut results = Vec::with_capacity(hosts.len());
    for host in &hosts {
        results.push(check_host(resolver, host, origin, latency_threshold, report).await);
    }

    let summary = MonitorSummary {
        origin: origin.to_string(),
        results,
    };

    report.info(format!(
        "Monitor summary for {origin}: {} pass, {} warn, {} fail",
        summary.count(CheckStatus::Pass),
        summary.count(CheckStatus::Warn),
        summary.count(CheckStatus::Fail)
    ));

    summary
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod monitor_tests;
