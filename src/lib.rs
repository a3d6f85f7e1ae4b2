// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # zonekeeper - BIND9 zone lifecycle from a host inventory
//!
//! zonekeeper turns a CSV host inventory into BIND forward and reverse zone
//! files, validates them with `named-checkzone`, backs up what is live,
//! atomically swaps the new files in and reloads the name server. A separate
//! health monitor checks the deployed zone against a live resolver.
//!
//! ## Modules
//!
//! - [`inventory`] - Inventory CSV parsing into typed host records
//! - [`serial`] - Date-versioned SOA serial allocation
//! - [`zone`] - Zone rendering, staging and read-back
//! - [`bind9`] - Zone checker, service reload and resolver collaborators
//! - [`backup`] - Verified, timestamped archives and retention
//! - [`deploy`] - Atomic promotion of validated zones
//! - [`monitor`] - Forward, reverse and latency checks
//! - [`pipeline`] - `generate`, `deploy` and `backup` orchestration
//! - [`report`] - Per-run reporting context and append-only log
//! - [`config`] - YAML configuration
//! - [`errors`] - Error types and exit codes
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use zonekeeper::inventory::parse_inventory_str;
//! use zonekeeper::serial::next_serial;
//!
//! let hosts = parse_inventory_str("hostname,ip,type,alias\nweb,192.168.1.10,A,www\n").unwrap();
//! assert_eq!(hosts.len(), 1);
//! assert_eq!(hosts[0].alias.as_deref(), Some("www"));
//!
//! assert_eq!(next_serial("2026101801", "20261018").unwrap(), 2026101802);
//! ```

pub mod backup;
pub mod bind9;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod errors;
pub mod inventory;
pub mod metrics;
pub mod monitor;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod serial;
pub mod zone;

#[cfg(test)]
pub(crate) mod testing;
