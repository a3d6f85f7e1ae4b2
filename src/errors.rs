// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the zone lifecycle.
//!
//! This module provides specialized error types for:
//! - Host inventory parsing (malformed header, rows, addresses, duplicates)
//! - SOA serial allocation
//! - Zone rendering and staging
//! - External zone validation
//! - Backup creation, verification and retention
//! - Atomic deployment and name-server reload
//! - Live DNS queries issued by the health monitor
//!
//! Every pipeline failure is funnelled into [`PipelineError`], which maps each
//! failure class onto a distinct process exit code so calling automation can
//! branch on it.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes, one per failure class.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const INVENTORY: i32 = 2;
    pub const VALIDATION: i32 = 3;
    pub const BACKUP: i32 = 4;
    pub const DEPLOY: i32 = 5;
    pub const SERIAL: i32 = 6;
    pub const CONFIG: i32 = 7;
    pub const MONITOR_FAILURES: i32 = 8;
}

/// Errors raised while reading the host inventory.
///
/// All of these are fatal: the renderer must never receive a partially valid
/// record set, so a single bad row aborts the whole generation.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The inventory file could not be read
    #[error("Failed to read inventory '{path}': {source}")]
    Unreadable {
        /// Path of the inventory file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The inventory has no header line at all
    #[error("Inventory is empty (expected header '{expected}')")]
    Empty {
        /// The header that was expected
        expected: &'static str,
    },

    /// The first line does not match the required header exactly
    #[error("Malformed inventory header '{found}' (expected '{expected}')")]
    MalformedHeader {
        /// Header that was found
        found: String,
        /// The header that was expected
        expected: &'static str,
    },

    /// A data row has the wrong number of columns
    #[error("Malformed inventory row {line}: expected {expected} fields, found {found}")]
    WrongFieldCount {
        /// 1-based line number in the inventory file
        line: usize,
        /// Number of columns required by the header
        expected: usize,
        /// Number of columns found
        found: usize,
    },

    /// A mandatory field is empty
    #[error("Malformed inventory row {line}: field '{field}' is empty")]
    EmptyField {
        /// 1-based line number in the inventory file
        line: usize,
        /// Column name
        field: &'static str,
    },

    /// The `ip` column is not an IPv4 dotted quad
    #[error("Malformed inventory row {line}: field 'ip' has invalid IPv4 address '{value}'")]
    InvalidAddress {
        /// 1-based line number in the inventory file
        line: usize,
        /// Offending value
        value: String,
    },

    /// The `type` column names a record type other than `A`
    #[error("Malformed inventory row {line}: field 'type' has unsupported record type '{value}'")]
    UnsupportedRecordType {
        /// 1-based line number in the inventory file
        line: usize,
        /// Offending value
        value: String,
    },

    /// A hostname or alias was already claimed by an earlier row
    #[error("Malformed inventory row {line}: field '{field}' duplicates name '{name}' first defined on row {first_line}")]
    DuplicateName {
        /// 1-based line number of the duplicate
        line: usize,
        /// Column holding the duplicate (`hostname` or `alias`)
        field: &'static str,
        /// Duplicated name
        name: String,
        /// Row that first defined the name
        first_line: usize,
    },
}

/// Errors raised by the SOA serial allocator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// The serial read from the deployed zone is not a decimal `u32`
    #[error("Existing SOA serial '{value}' is not a valid serial number")]
    InvalidExisting {
        /// Raw serial text
        value: String,
    },

    /// The supplied date is not an 8-digit `YYYYMMDD` string
    #[error("Date '{value}' is not in YYYYMMDD form")]
    InvalidDate {
        /// Raw date text
        value: String,
    },

    /// All 99 same-day sequence numbers are used up
    #[error("SOA serial sequence exhausted for {date}: 99 regenerations already made today")]
    SequenceExhausted {
        /// Date whose sequence ran out
        date: String,
    },

    /// Incrementing the serial would overflow 32 bits
    #[error("SOA serial {value} cannot be incremented without overflowing")]
    Overflow {
        /// Serial that could not be incremented
        value: u32,
    },
}

/// Errors raised while rendering or staging zone text.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A zone or server name is unusable
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The staged temporary file could not be created or written
    #[error("Failed to stage zone '{zone}' in {dir}: {source}")]
    Staging {
        /// Zone being staged
        zone: String,
        /// Directory the temporary file was created in
        dir: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The currently deployed zone could not be read
    #[error("Failed to read deployed zone '{path}': {source}")]
    ReadDeployed {
        /// Live zone path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised when running an external process.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The command line was empty
    #[error("No command configured")]
    EmptyCommand,

    /// The program could not be started
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The program did not finish within its timeout
    #[error("'{program}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Program name
        program: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// The program exited unsuccessfully
    #[error("'{program}' exited with {status}: {output}")]
    Failed {
        /// Program name
        program: String,
        /// Exit status description
        status: String,
        /// Combined stdout/stderr
        output: String,
    },
}

/// Errors raised by the zone validation gate.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The checker ran and rejected the staged zone
    #[error("Zone '{zone}' failed validation ({path}):\n{output}")]
    Rejected {
        /// Zone origin
        zone: String,
        /// Staged file that was checked
        path: PathBuf,
        /// Checker output
        output: String,
    },

    /// The checker could not be run at all
    #[error("Zone checker could not validate '{zone}': {source}")]
    CheckerUnavailable {
        /// Zone origin
        zone: String,
        /// Underlying process error
        #[source]
        source: ProcessError,
    },
}

/// Errors raised by the backup manager.
#[derive(Error, Debug)]
pub enum BackupError {
    /// None of the requested source paths exist
    #[error("Nothing to back up: none of the source paths exist")]
    NoSources,

    /// Archive creation or retention hit an I/O error
    #[error("Backup I/O error on '{path}': {source}")]
    Io {
        /// Path being written or removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The read-back check of a freshly written archive failed
    #[error("Backup archive '{path}' failed verification: {reason}")]
    Verification {
        /// Archive path
        path: PathBuf,
        /// Why verification failed
        reason: String,
    },
}

/// Errors raised by the atomic deployer.
#[derive(Error, Debug)]
pub enum DeployError {
    /// A staged file could not be renamed onto its live path
    #[error("Failed to replace live zone '{path}': {source}")]
    Replace {
        /// Live path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The name server reload command failed
    #[error("Name server reload failed: {source}")]
    Reload {
        /// Underlying process error
        #[source]
        source: ProcessError,
    },
}

/// Errors raised by live DNS queries.
///
/// These never abort a monitoring run; they are recorded as a failed check
/// for the affected host only.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The query name could not be parsed
    #[error("Invalid query name '{name}': {reason}")]
    InvalidName {
        /// Query name
        name: String,
        /// Parser message
        reason: String,
    },

    /// The resolver could not be reached or returned an error
    #[error("Query for '{name}' against {server} failed: {reason}")]
    QueryFailed {
        /// Query name
        name: String,
        /// Resolver address
        server: String,
        /// Error detail
        reason: String,
    },

    /// The resolver answered with a non-success response code
    #[error("Query for '{name}' against {server} returned {rcode}")]
    ErrorResponse {
        /// Query name
        name: String,
        /// Resolver address
        server: String,
        /// DNS response code
        rcode: String,
    },
}

/// Errors that stop a monitoring run before any host is checked.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The deployed forward zone could not be read
    #[error("Failed to read deployed zone '{path}': {source}")]
    ZoneUnreadable {
        /// Zone file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No origin was given and none could be derived from the zone file
    #[error("Cannot determine the zone origin of '{path}': pass --forward-zone")]
    UnknownOrigin {
        /// Zone file path
        path: PathBuf,
    },
}

/// Top-level error for a `generate`, `deploy` or `backup` run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl PipelineError {
    /// Exit code for this failure class.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Inventory(_) => exit_code::INVENTORY,
            Self::Serial(_) => exit_code::SERIAL,
            Self::Render(_) => exit_code::GENERAL,
            Self::Validation(_) => exit_code::VALIDATION,
            Self::Backup(_) => exit_code::BACKUP,
            Self::Deploy(_) => exit_code::DEPLOY,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
