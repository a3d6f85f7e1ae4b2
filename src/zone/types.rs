// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed zone data shared by the parser, renderer and monitor.

use std::net::Ipv4Addr;

/// Record types accepted from the host inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
}

impl RecordType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One host from the inventory.
///
/// Hostnames are relative to the zone origin. An alias, when present, is
/// rendered as a CNAME pointing at `hostname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub hostname: String,
    pub ipv4: Ipv4Addr,
    pub record_type: RecordType,
    pub alias: Option<String>,
}

/// Start-of-authority data for a generated zone pair.
///
/// `primary_ns` and `admin_contact` are stored fully qualified with a trailing
/// dot. The timer values are fixed policy (see [`crate::constants`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub serial: u32,
    pub ttl: u32,
    pub primary_ns: String,
    pub admin_contact: String,
}

/// A zone generation: forward origin, reverse origin, SOA and records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDocument {
    /// Forward origin without trailing dot (e.g. `devops.lab`)
    pub origin: String,
    /// Reverse origin without trailing dot (e.g. `1.168.192.in-addr.arpa`)
    pub reverse_origin: String,
    pub soa: SoaData,
    /// Address of the primary name server, rendered as glue when in-zone
    pub name_server_ip: Option<Ipv4Addr>,
    pub records: Vec<HostRecord>,
}

impl ZoneDocument {
    /// Fully qualified name of `host` inside the forward origin.
    #[must_use]
    pub fn fqdn(&self, host: &str) -> String {
        format!("{host}.{}.", self.origin)
    }
}

/// An `(hostname, address)` pair read back from a deployed forward zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedHost {
    pub hostname: String,
    pub expected_ip: Ipv4Addr,
}
