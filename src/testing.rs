// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::bind9::{CheckResult, Resolver, ServiceController, ZoneChecker};
use crate::errors::{ProcessError, ResolveError};

/// Checker that passes every zone unless told otherwise, and remembers what
/// it was shown.
#[derive(Debug, Default)]
pub struct FakeChecker {
    rejected: HashMap<String, String>,
    unavailable: bool,
    calls: Mutex<Vec<(String, PathBuf, String)>>,
}

impl FakeChecker {
    pub fn passing() -> Self {
        Self::default()
    }

    pub fn rejecting(origin: &str, output: &str) -> Self {
        let mut checker = Self::default();
        checker
            .rejected
            .insert(origin.to_string(), output.to_string());
        checker
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// `(origin, path, file content at check time)` for every call.
    pub fn calls(&self) -> Vec<(String, PathBuf, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ZoneChecker for FakeChecker {
    async fn check_zone(&self, origin: &str, path: &Path) -> Result<CheckResult, ProcessError> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((origin.to_string(), path.to_path_buf(), content));

        if self.unavailable {
            return Err(ProcessError::Spawn {
                program: "named-checkzone".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }

        Ok(match self.rejected.get(origin) {
            Some(output) => CheckResult {
                passed: false,
                output: output.clone(),
            },
            None => CheckResult {
                passed: true,
                output: format!("zone {origin}/IN: loaded serial 1\nOK"),
            },
        })
    }
}

/// Service controller that counts reloads and optionally fails them.
#[derive(Debug, Default)]
pub struct FakeService {
    fail: bool,
    reloads: AtomicUsize,
}

impl FakeService {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceController for FakeService {
    async fn reload(&self) -> Result<(), ProcessError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProcessError::Failed {
                program: "systemctl".to_string(),
                status: "exit status: 1".to_string(),
                output: "Job for bind9.service failed".to_string(),
            });
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "fake reload".to_string()
    }
}

/// Resolver answering from fixed tables.
#[derive(Debug, Default)]
pub struct FakeResolver {
    forward: HashMap<String, Result<Vec<Ipv4Addr>, ResolveError>>,
    reverse: HashMap<Ipv4Addr, Result<Vec<String>, ResolveError>>,
    delay: Option<Duration>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_a(mut self, fqdn: &str, addresses: &[Ipv4Addr]) -> Self {
        self.forward
            .insert(fqdn.to_string(), Ok(addresses.to_vec()));
        self
    }

    pub fn with_a_error(mut self, fqdn: &str) -> Self {
        self.forward.insert(
            fqdn.to_string(),
            Err(ResolveError::QueryFailed {
                name: fqdn.to_string(),
                server: "127.0.0.1:53".to_string(),
                reason: "timed out".to_string(),
            }),
        );
        self
    }

    pub fn with_ptr(mut self, ip: Ipv4Addr, names: &[&str]) -> Self {
        self.reverse
            .insert(ip, Ok(names.iter().map(|n| (*n).to_string()).collect()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn lookup_a(&self, fqdn: &str) -> Result<Vec<Ipv4Addr>, ResolveError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.forward
            .get(fqdn)
            .cloned()
            .unwrap_or_else(|| {
                Err(ResolveError::ErrorResponse {
                    name: fqdn.to_string(),
                    server: "127.0.0.1:53".to_string(),
                    rcode: "NXDomain".to_string(),
                })
            })
    }

    async fn lookup_ptr(&self, ip: Ipv4Addr) -> Result<Vec<String>, ResolveError> {
        self.reverse.get(&ip).cloned().unwrap_or_else(|| {
            Err(ResolveError::ErrorResponse {
                name: crate::bind9::reverse_name(ip),
                server: "127.0.0.1:53".to_string(),
                rcode: "NXDomain".to_string(),
            })
        })
    }

    fn server(&self) -> String {
        "127.0.0.1:53".to_string()
    }
}
