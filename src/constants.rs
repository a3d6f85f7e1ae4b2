// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for zonekeeper.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Inventory Constants
// ============================================================================

/// Exact header line required at the top of every host inventory
pub const INVENTORY_HEADER: &str = "hostname,ip,type,alias";

/// Field delimiter used by the host inventory
pub const INVENTORY_DELIMITER: char = ',';

/// Only record type accepted in the inventory `type` column
pub const RECORD_TYPE_A: &str = "A";

// ============================================================================
// SOA Policy Constants
// ============================================================================

/// SOA refresh interval (7 days)
pub const SOA_REFRESH_SECS: u32 = 604_800;

/// SOA retry interval (1 day)
pub const SOA_RETRY_SECS: u32 = 86_400;

/// SOA expire time (28 days)
pub const SOA_EXPIRE_SECS: u32 = 2_419_200;

/// SOA negative cache TTL (5 minutes)
pub const SOA_NEGATIVE_TTL_SECS: u32 = 300;

/// Default `$TTL` for rendered zones (1 day)
pub const DEFAULT_ZONE_TTL_SECS: u32 = 86_400;

// ============================================================================
// Serial Constants
// ============================================================================

/// Length of the `YYYYMMDD` date prefix of a serial
pub const SERIAL_DATE_LEN: usize = 8;

/// First same-day sequence number
pub const SERIAL_FIRST_SEQUENCE: u32 = 1;

/// Last same-day sequence number representable in two digits
pub const SERIAL_MAX_SEQUENCE: u32 = 99;

// ============================================================================
// Filesystem Constants
// ============================================================================

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zonekeeper/config.yaml";

/// Default live zone directory
pub const DEFAULT_ZONES_DIR: &str = "/etc/bind/zones";

/// Default BIND configuration tree
pub const DEFAULT_BIND_CONFIG_DIR: &str = "/etc/bind";

/// Default backup root (one subdirectory per category)
pub const DEFAULT_BACKUP_ROOT: &str = "/var/backups/zonekeeper";

/// Default append-only log file
pub const DEFAULT_LOG_FILE: &str = "/var/log/zonekeeper/zonekeeper.log";

/// Default directory for per-run reports
pub const DEFAULT_REPORT_DIR: &str = "/var/log/zonekeeper/reports";

/// Prefix of live zone file names (`db.<zone>`)
pub const ZONE_FILE_PREFIX: &str = "db.";

/// Permissions applied to live zone files (readable by the name server)
pub const DEFAULT_ZONE_FILE_MODE: u32 = 0o644;

/// Permissions applied to backup archives (owner only)
pub const BACKUP_FILE_MODE: u32 = 0o600;

/// Extension of backup archives
pub const BACKUP_ARCHIVE_EXTENSION: &str = "tar.gz";

/// Extension of the checksum sidecar written next to each archive
pub const BACKUP_CHECKSUM_EXTENSION: &str = "sha256";

/// Timestamp format embedded in archive names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Backup category for live zone files
pub const BACKUP_CATEGORY_ZONES: &str = "zones";

/// Backup category for the full BIND configuration tree
pub const BACKUP_CATEGORY_CONFIG: &str = "config";

/// Retention window for zone backups
pub const DEFAULT_ZONE_RETENTION_DAYS: u32 = 30;

/// Retention window for configuration backups
pub const DEFAULT_CONFIG_RETENTION_DAYS: u32 = 7;

// ============================================================================
// External Collaborator Constants
// ============================================================================

/// Default zone syntax checker
pub const DEFAULT_CHECKER_PROGRAM: &str = "named-checkzone";

/// Default timeout for one zone check
pub const DEFAULT_CHECKER_TIMEOUT_SECS: u64 = 10;

/// Default name-server reload command
pub const DEFAULT_RELOAD_COMMAND: [&str; 3] = ["systemctl", "reload", "bind9"];

/// Default timeout for the reload command
pub const DEFAULT_RELOAD_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Monitoring Constants
// ============================================================================

/// Standard DNS port for queries
pub const DNS_PORT: u16 = 53;

/// Default latency threshold before a query is classified as slow
pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 100;

/// Default per-query timeout
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 3;

/// Reverse lookup suffix for IPv4
pub const IN_ADDR_ARPA: &str = "in-addr.arpa";

// ============================================================================
// Logging Constants
// ============================================================================

/// Timestamp format for log and report lines
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format for report file names
pub const REPORT_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
