// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared collaborators for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

use zonekeeper::bind9::{CheckResult, Resolver, ServiceController, ZoneChecker};
use zonekeeper::config::Config;
use zonekeeper::errors::{ProcessError, ResolveError};

/// Checker that accepts any file with an SOA record and remembers each check.
#[derive(Default)]
pub struct SoaChecker {
    pub checked: Mutex<Vec<(String, PathBuf)>>,
}

#[async_trait]
impl ZoneChecker for SoaChecker {
    async fn check_zone(&self, origin: &str, path: &Path) -> Result<CheckResult, ProcessError> {
        self.checked
            .lock()
            .unwrap()
            .push((origin.to_string(), path.to_path_buf()));
        let text = std::fs::read_to_string(path).unwrap_or_default();
        let passed = text.contains("\tIN\tSOA\t");
        Ok(CheckResult {
            passed,
            output: if passed {
                format!("zone {origin}/IN: loaded\nOK")
            } else {
                format!("zone {origin}/IN: has no SOA record")
            },
        })
    }
}

/// Service controller that only counts reloads.
#[derive(Default)]
pub struct CountingService {
    pub reloads: AtomicUsize,
}

impl CountingService {
    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceController for CountingService {
    async fn reload(&self) -> Result<(), ProcessError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "counting reload".to_string()
    }
}

/// Resolver answering from fixed forward and reverse tables.
#[derive(Default)]
pub struct TableResolver {
    pub forward: HashMap<String, Vec<Ipv4Addr>>,
    pub reverse: HashMap<Ipv4Addr, Vec<String>>,
}

#[async_trait]
impl Resolver for TableResolver {
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        self.forward
            .get(fqdn)
            .cloned()
            .ok_or_else(|| ResolveError::ErrorResponse {
                name: fqdn.to_string(),
                server: self.server(),
                rcode: "NXDomain".to_string(),
            })
    }

    async fn lookup_ptr(&self, ip: Ipv4Addr) -> Result<Vec<String>, ResolveError> {
        self.reverse
            .get(&ip)
            .cloned()
            .ok_or_else(|| ResolveError::ErrorResponse {
                name: zonekeeper::bind9::reverse_name(ip),
                server: self.server(),
                rcode: "NXDomain".to_string(),
            })
    }

    fn server(&self) -> String {
        "127.0.0.1:53".to_string()
    }
}

/// Configuration rooted in a temporary directory.
pub fn temp_config(work: &TempDir) -> Config {
    let mut config = Config::default();
    config.zones_dir = work.path().join("zones");
    config.bind_config_dir = work.path().join("bind");
    config.backup_root = work.path().join("backups");
    config.log_file = work.path().join("log").join("zonekeeper.log");
    config.report_dir = work.path().join("reports");
    config.soa.primary_ns = "ns1".to_string();
    config.soa.admin_contact = "admin@devops.lab".to_string();
    config.soa.name_server_ip = Some(Ipv4Addr::new(192, 168, 1, 2));
    config
}
