// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Running external programs with an explicit timeout.
//!
//! The zone checker and the reload command are both external programs. Neither
//! is trusted to return promptly, so every invocation is bounded by a timeout
//! and the child is killed if it expires.

use std::ffi::OsStr;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::errors::ProcessError;

/// Captured result of a finished program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the program exited with status 0
    pub success: bool,
    /// Human readable exit status
    pub status: String,
    /// stdout followed by stderr, trimmed
    pub output: String,
}

/// Run `program` with `args`, waiting at most `timeout`.
///
/// A non-zero exit status is not an error here; callers decide what it means.
///
/// # Errors
///
/// Returns [`ProcessError::Spawn`] if the program cannot be started and
/// [`ProcessError::Timeout`] if it does not finish in time.
pub async fn run_command<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let start = Instant::now();
    let child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(result) => result.map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(ProcessError::Timeout {
                program: program.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }

    debug!(
        program = %program,
        status = %output.status,
        elapsed = ?start.elapsed(),
        "External command finished"
    );

    Ok(ProcessOutput {
        success: output.status.success(),
        status: output.status.to_string(),
        output: text.trim().to_string(),
    })
}

/// Split a configured command line into program and arguments.
///
/// # Errors
///
/// Returns [`ProcessError::EmptyCommand`] for an empty command.
pub fn split_command(command: &[String]) -> Result<(&str, &[String]), ProcessError> {
    command
        .split_first()
        .map(|(program, args)| (program.as_str(), args))
        .ok_or(ProcessError::EmptyCommand)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod process_tests;
