// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! YAML configuration.
//!
//! Every key is optional; an absent key takes its default. The default
//! configuration file (`/etc/zonekeeper/config.yaml`) is itself optional, but
//! a file named with `--config` must exist.
//!
//! ```yaml
//! zones_dir: /etc/bind/zones
//! zone_file_mode: 0o644
//! soa:
//!   primary_ns: ns1
//!   admin_contact: admin@devops.lab
//!   name_server_ip: 192.168.1.2
//! retention:
//!   zones_days: 30
//! service:
//!   reload_command: [rndc, reload]
//! monitor:
//!   server: 192.168.1.2
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::constants::{
    DEFAULT_BACKUP_ROOT, DEFAULT_BIND_CONFIG_DIR, DEFAULT_CHECKER_PROGRAM,
    DEFAULT_CHECKER_TIMEOUT_SECS, DEFAULT_CONFIG_PATH, DEFAULT_CONFIG_RETENTION_DAYS,
    DEFAULT_LATENCY_THRESHOLD_MS, DEFAULT_LOG_FILE, DEFAULT_QUERY_TIMEOUT_SECS,
    DEFAULT_RELOAD_COMMAND, DEFAULT_RELOAD_TIMEOUT_SECS, DEFAULT_REPORT_DIR,
    DEFAULT_ZONES_DIR, DEFAULT_ZONE_FILE_MODE, DEFAULT_ZONE_RETENTION_DAYS,
    DEFAULT_ZONE_TTL_SECS, DNS_PORT,
};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the live `db.<zone>` files
    pub zones_dir: PathBuf,

    /// BIND configuration tree, archived by `backup --category config`
    pub bind_config_dir: PathBuf,

    /// Root of the backup archives (one subdirectory per category)
    pub backup_root: PathBuf,

    /// Append-only run log
    pub log_file: PathBuf,

    /// Directory for per-run summary reports
    pub report_dir: PathBuf,

    /// Mode given to deployed zone files
    pub zone_file_mode: u32,

    pub soa: SoaConfig,
    pub retention: RetentionConfig,
    pub checker: CheckerConfig,
    pub service: ServiceConfig,
    pub monitor: MonitorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zones_dir: PathBuf::from(DEFAULT_ZONES_DIR),
            bind_config_dir: PathBuf::from(DEFAULT_BIND_CONFIG_DIR),
            backup_root: PathBuf::from(DEFAULT_BACKUP_ROOT),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            zone_file_mode: DEFAULT_ZONE_FILE_MODE,
            soa: SoaConfig::default(),
            retention: RetentionConfig::default(),
            checker: CheckerConfig::default(),
            service: ServiceConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

/// SOA and NS values for generated zones.
///
/// Names may be relative to the forward zone (`ns1`), absolute
/// (`ns1.example.com.`) or, for the contact, an e-mail address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoaConfig {
    pub ttl: u32,
    pub primary_ns: String,
    pub admin_contact: String,
    /// Address of the primary NS; rendered as glue when it is in-zone
    pub name_server_ip: Option<Ipv4Addr>,
}

impl Default for SoaConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_ZONE_TTL_SECS,
            primary_ns: "ns1".to_string(),
            admin_contact: "admin".to_string(),
            name_server_ip: None,
        }
    }
}

/// Backup retention windows in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    pub zones_days: u32,
    pub config_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            zones_days: DEFAULT_ZONE_RETENTION_DAYS,
            config_days: DEFAULT_CONFIG_RETENTION_DAYS,
        }
    }
}

/// Zone syntax checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_CHECKER_PROGRAM.to_string(),
            timeout_secs: DEFAULT_CHECKER_TIMEOUT_SECS,
        }
    }
}

impl CheckerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Name server reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Program and arguments, e.g. `[rndc, reload]`
    pub reload_command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reload_command: DEFAULT_RELOAD_COMMAND.iter().map(|s| (*s).to_string()).collect(),
            timeout_secs: DEFAULT_RELOAD_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Health monitor resolver and thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub server: IpAddr,
    pub port: u16,
    pub latency_threshold_ms: u64,
    pub query_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            server: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DNS_PORT,
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server, self.port)
    }

    #[must_use]
    pub fn latency_threshold(&self) -> Duration {
        Duration::from_millis(self.latency_threshold_ms)
    }

    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing, or if any
    /// file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or has unknown keys.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reject values that would make an operation meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid key.
    pub fn validate(&self) -> Result<()> {
        if self.checker.timeout_secs == 0 {
            bail!("checker.timeout_secs must be greater than zero");
        }
        if self.service.timeout_secs == 0 {
            bail!("service.timeout_secs must be greater than zero");
        }
        if self.monitor.query_timeout_secs == 0 {
            bail!("monitor.query_timeout_secs must be greater than zero");
        }
        if self.retention.zones_days == 0 {
            bail!("retention.zones_days must be greater than zero");
        }
        if self.retention.config_days == 0 {
            bail!("retention.config_days must be greater than zero");
        }
        if self.service.reload_command.is_empty()
            || self.service.reload_command[0].trim().is_empty()
        {
            bail!("service.reload_command must name a program");
        }
        if self.checker.program.trim().is_empty() {
            bail!("checker.program must name a program");
        }
        if self.zone_file_mode > 0o7777 {
            bail!("zone_file_mode {:o} is not a file mode", self.zone_file_mode);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
