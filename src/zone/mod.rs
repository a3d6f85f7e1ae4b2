// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! BIND master-file generation and inspection.
//!
//! This module turns a [`ZoneDocument`] into forward and reverse zone text,
//! stages that text in hidden temporary files next to the live zones, and
//! reads back what is currently deployed (the SOA serial and the A records).
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use zonekeeper::zone::{render_forward, HostRecord, RecordType, SoaData, ZoneDocument};
//!
//! let doc = ZoneDocument {
//!     origin: "devops.lab".to_string(),
//!     reverse_origin: "1.168.192.in-addr.arpa".to_string(),
//!     soa: SoaData {
//!         serial: 2026101801,
//!         ttl: 86400,
//!         primary_ns: "ns1.devops.lab.".to_string(),
//!         admin_contact: "admin.devops.lab.".to_string(),
//!     },
//!     name_server_ip: None,
//!     records: vec![HostRecord {
//!         hostname: "web".to_string(),
//!         ipv4: Ipv4Addr::new(192, 168, 1, 10),
//!         record_type: RecordType::A,
//!         alias: Some("www".to_string()),
//!     }],
//! };
//!
//! let text = render_forward(&doc);
//! assert!(text.contains("web\tIN\tA\t192.168.1.10"));
//! assert!(text.contains("www\tIN\tCNAME\tweb"));
//! ```

pub mod parse;
pub mod render;
pub mod stage;
pub mod types;

pub use parse::{extract_a_records, extract_origin, extract_serial, read_deployed_serial};
pub use render::{
    normalize_origin, qualify_name, render_forward, render_reverse, reverse_mismatches,
};
pub use stage::{live_zone_path, stage_zone, StagedZone};
pub use types::{DeployedHost, HostRecord, RecordType, SoaData, ZoneDocument};
