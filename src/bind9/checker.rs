// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone validation gate.
//!
//! Staged zone files are checked one by one by an external authority-format
//! checker. The gate is hard: if any file fails, or the checker cannot run at
//! all, nothing live is touched.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::errors::{ProcessError, ValidationError};
use crate::process::run_command;
use crate::report::Report;
use crate::zone::StagedZone;

/// Outcome of checking one zone file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    /// Checker output, shown to the operator on failure
    pub output: String,
}

/// Validates zone files before they are deployed.
#[async_trait]
pub trait ZoneChecker: Send + Sync {
    /// Check the zone file at `path` as zone `origin`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProcessError`] only if the checker could not be run; a
    /// rejected zone is a successful call with `passed == false`.
    async fn check_zone(&self, origin: &str, path: &Path) -> Result<CheckResult, ProcessError>;
}

/// [`ZoneChecker`] backed by BIND's `named-checkzone <origin> <file>`.
#[derive(Debug, Clone)]
pub struct NamedCheckzone {
    program: String,
    timeout: Duration,
}

impl NamedCheckzone {
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ZoneChecker for NamedCheckzone {
    async fn check_zone(&self, origin: &str, path: &Path) -> Result<CheckResult, ProcessError> {
        let args = [std::ffi::OsStr::new(origin), path.as_os_str()];
        let output = run_command(&self.program, &args, self.timeout).await?;

        debug!(
            zone = %origin,
            path = %path.display(),
            passed = output.success,
            "named-checkzone finished"
        );

        Ok(CheckResult {
            passed: output.success,
            output: output.output,
        })
    }
}

/// Validate every staged zone independently.
///
/// All files are checked and reported even when an earlier one fails, so the
/// operator sees every problem in one run. The first failure is returned.
///
/// # Errors
///
/// Returns [`ValidationError::Rejected`] if the checker rejects any file and
/// [`ValidationError::CheckerUnavailable`] if it cannot be run.
pub async fn validate_staged(
    checker: &dyn ZoneChecker,
    staged: &[&StagedZone],
    report: &mut Report,
) -> Result<(), ValidationError> {
    let mut first_failure = None;

    for zone in staged {
        let outcome = match checker.check_zone(zone.origin(), zone.path()).await {
            Ok(result) if result.passed => {
                report.pass(format!("Zone {} passed validation", zone.origin()));
                continue;
            }
            Ok(result) => {
                report.fail(format!(
                    "Zone {} failed validation: {}",
                    zone.origin(),
                    result.output
                ));
                ValidationError::Rejected {
                    zone: zone.origin().to_string(),
                    path: zone.path().to_path_buf(),
                    output: result.output,
                }
            }
            Err(source) => {
                report.error(format!(
                    "Zone {} could not be validated: {source}",
                    zone.origin()
                ));
                ValidationError::CheckerUnavailable {
                    zone: zone.origin().to_string(),
                    source,
                }
            }
        };

        if first_failure.is_none() {
            first_failure = Some(outcome);
        }
    }

    first_failure.map_or(Ok(()), Err)
}

#[cfg(test)]
#[path = "checker_tests.rs"]
mod checker_tests;
