// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Run reporting context.
//!
//! A [`Report`] is created once per CLI run and passed by `&mut` to every
//! component that has something to say. Each entry is timestamped and tagged
//! with a [`Severity`], mirrored to `tracing`, and appended to the configured
//! log file as a single line:
//!
//! ```text
//! [2026-10-18 14:02:11] [INFO] Serial 2026101801 -> 2026101802
//! ```
//!
//! When the run finishes, [`Report::write_summary`] writes a standalone report
//! file describing what changed, what was validated, what was backed up, and
//! what was deployed or skipped.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::{LOG_TIMESTAMP_FORMAT, REPORT_FILE_TIMESTAMP_FORMAT};

/// Severity tag of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Pass,
    Fail,
}

impl Severity {
    /// Tag written between brackets in log lines.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped report line.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl ReportEntry {
    /// Render the entry in the append-only log format.
    #[must_use]
    pub fn to_log_line(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format(LOG_TIMESTAMP_FORMAT),
            self.severity,
            self.message
        )
    }
}

/// Reporting context for one run.
#[derive(Debug)]
pub struct Report {
    operation: String,
    started_at: DateTime<Local>,
    entries: Vec<ReportEntry>,
    log_file: Option<File>,
}

impl Report {
    /// Create a report that only records entries in memory (and to `tracing`).
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            started_at: Local::now(),
            entries: Vec::new(),
            log_file: None,
        }
    }

    /// Create a report that also appends every entry to `log_path`.
    ///
    /// A log file that cannot be opened is logged and otherwise ignored; it
    /// never prevents the run itself.
    #[must_use]
    pub fn with_log_file(operation: &str, log_path: &Path) -> Self {
        let mut report = Self::new(operation);

        if let Some(parent) = log_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Cannot create log directory");
            }
        }

        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => report.log_file = Some(file),
            Err(e) => warn!(
                path = %log_path.display(),
                error = %e,
                "Cannot open log file, continuing without it"
            ),
        }

        report
    }

    /// Operation name this report belongs to (`generate`, `deploy`, ...).
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// All entries recorded so far, in order.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Number of entries with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Severity::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.push(Severity::Pass, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.push(Severity::Fail, message.into());
    }

    /// Append an entry, mirror it to `tracing` and to the log file.
    pub fn push(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Info | Severity::Pass => {
                info!(operation = %self.operation, severity = %severity, "{message}");
            }
            Severity::Warn => warn!(operation = %self.operation, "{message}"),
            Severity::Error | Severity::Fail => {
                error!(operation = %self.operation, severity = %severity, "{message}");
            }
        }

        let entry = ReportEntry {
            timestamp: Local::now(),
            severity,
            message,
        };

        if let Some(file) = self.log_file.as_mut() {
            if let Err(e) = writeln!(file, "{}", entry.to_log_line()) {
                warn!(error = %e, "Failed to append to log file, disabling file logging");
                self.log_file = None;
            }
        }

        self.entries.push(entry);
    }

    /// Render the full report text.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "zonekeeper {} report, started {}",
            self.operation,
            self.started_at.format(LOG_TIMESTAMP_FORMAT)
        );
        let _ = writeln!(out, "{}", "=".repeat(60));
        for entry in &self.entries {
            let _ = writeln!(out, "{}", entry.to_log_line());
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
        let _ = writeln!(
            out,
            "info={} warn={} error={} pass={} fail={}",
            self.count(Severity::Info),
            self.count(Severity::Warn),
            self.count(Severity::Error),
            self.count(Severity::Pass),
            self.count(Severity::Fail)
        );
        out
    }

    /// Write the summary to a fresh timestamped file under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_summary(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}-{}.report",
            self.operation,
            self.started_at.format(REPORT_FILE_TIMESTAMP_FORMAT)
        ));
        std::fs::write(&path, self.render_summary())?;
        Ok(path)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;
