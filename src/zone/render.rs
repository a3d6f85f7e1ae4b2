// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Forward and reverse zone text rendering.
//!
//! Rendering is pure: it only builds strings. Writing the result anywhere is
//! the job of [`super::stage`].

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use super::types::{HostRecord, ZoneDocument};
use crate::constants::{
    IN_ADDR_ARPA, SOA_EXPIRE_SECS, SOA_NEGATIVE_TTL_SECS, SOA_REFRESH_SECS, SOA_RETRY_SECS,
};
use crate::errors::RenderError;

/// Strip a trailing dot and reject empty or whitespace-bearing origins.
///
/// # Errors
///
/// Returns [`RenderError::InvalidName`] for an unusable origin.
pub fn normalize_origin(origin: &str) -> Result<String, RenderError> {
    let trimmed = origin.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(RenderError::InvalidName {
            name: origin.to_string(),
            reason: "zone origin is empty".to_string(),
        });
    }
    if trimmed.chars().any(char::is_whitespace) || trimmed.contains("..") {
        return Err(RenderError::InvalidName {
            name: origin.to_string(),
            reason: "zone origin is not a valid domain name".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Turn a configured server or contact name into a trailing-dot FQDN.
///
/// - `ns1` (no dot) is relative to `origin`: `ns1.devops.lab.`
/// - `ns1.example.com` or `ns1.example.com.` is taken as absolute
/// - `admin@devops.lab` becomes the SOA mailbox form `admin.devops.lab.`
///
/// # Errors
///
/// Returns [`RenderError::InvalidName`] for empty names or names containing whitespace.
pub fn qualify_name(name: &str, origin: &str) -> Result<String, RenderError> {
    let name = name.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(RenderError::InvalidName {
            name: name.to_string(),
            reason: "name is empty or contains whitespace".to_string(),
        });
    }

    let name = name.replacen('@', ".", 1);
    if name.ends_with('.') {
        Ok(name)
    } else if name.contains('.') {
        Ok(format!("{name}."))
    } else {
        Ok(format!("{name}.{origin}."))
    }
}

fn render_header(out: &mut String, doc: &ZoneDocument, origin: &str) {
    let soa = &doc.soa;
    let _ = writeln!(out, "; Zone {origin} generated by zonekeeper, serial {}", soa.serial);
    let _ = writeln!(out, "$TTL {}", soa.ttl);
    let _ = writeln!(out, "$ORIGIN {origin}.");
    let _ = writeln!(
        out,
        "@\tIN\tSOA\t{} {} (",
        soa.primary_ns, soa.admin_contact
    );
    let _ = writeln!(out, "\t\t\t{}\t; Serial", soa.serial);
    let _ = writeln!(out, "\t\t\t{SOA_REFRESH_SECS}\t\t; Refresh");
    let _ = writeln!(out, "\t\t\t{SOA_RETRY_SECS}\t\t; Retry");
    let _ = writeln!(out, "\t\t\t{SOA_EXPIRE_SECS}\t\t; Expire");
    let _ = writeln!(out, "\t\t\t{SOA_NEGATIVE_TTL_SECS} )\t\t; Negative Cache TTL");
    let _ = writeln!(out, ";");
    let _ = writeln!(out, "@\tIN\tNS\t{}", soa.primary_ns);
}

/// Label of the primary name server relative to the forward origin, when it
/// lives inside that origin and therefore needs a glue record.
fn in_zone_ns_label(doc: &ZoneDocument) -> Option<&str> {
    let suffix = format!(".{}.", doc.origin);
    doc.soa
        .primary_ns
        .strip_suffix(suffix.as_str())
        .filter(|label| !label.is_empty())
}

/// Glue record for the primary name server, unless the inventory already
/// defines a host with the same label.
fn ns_glue(doc: &ZoneDocument) -> Option<(&str, Ipv4Addr)> {
    let ip = doc.name_server_ip?;
    let label = in_zone_ns_label(doc)?;
    let inventory_defines_ns = doc
        .records
        .iter()
        .any(|r| r.hostname.eq_ignore_ascii_case(label));
    (!inventory_defines_ns).then_some((label, ip))
}

/// Render the forward zone: header, optional NS glue, then one A record per
/// host with its CNAME alias directly after it.
#[must_use]
pub fn render_forward(doc: &ZoneDocument) -> String {
    let mut out = String::new();
    render_header(&mut out, doc, &doc.origin);

    if let Some((label, ip)) = ns_glue(doc) {
        let _ = writeln!(out, "{label}\tIN\tA\t{ip}");
    }

    let _ = writeln!(out, ";");
    for record in &doc.records {
        let _ = writeln!(
            out,
            "{}\tIN\t{}\t{}",
            record.hostname, record.record_type, record.ipv4
        );
        if let Some(alias) = &record.alias {
            let _ = writeln!(out, "{alias}\tIN\tCNAME\t{}", record.hostname);
        }
    }
    out
}

/// Render the reverse zone: header, a PTR for the in-zone name server glue
/// when its address is inside the reverse `/24`, then one PTR per host keyed
/// by the last octet of its address.
#[must_use]
pub fn render_reverse(doc: &ZoneDocument) -> String {
    let mut out = String::new();
    render_header(&mut out, doc, &doc.reverse_origin);

    // The glue A gets its PTR too, unless an inventory host already owns
    // that address.
    if let Some((label, ip)) = ns_glue(doc) {
        let in_reverse_zone = reverse_network(&doc.reverse_origin)
            .is_some_and(|network| in_network(ip, network));
        let address_taken = doc.records.iter().any(|r| r.ipv4 == ip);
        if in_reverse_zone && !address_taken {
            let _ = writeln!(out, "{}\tIN\tPTR\t{}", ip.octets()[3], doc.fqdn(label));
        }
    }

    let _ = writeln!(out, ";");
    for record in &doc.records {
        let last_octet = record.ipv4.octets()[3];
        let _ = writeln!(out, "{last_octet}\tIN\tPTR\t{}", doc.fqdn(&record.hostname));
    }
    out
}

/// Network prefix encoded by a `/24` reverse origin such as
/// `1.168.192.in-addr.arpa`.
fn reverse_network(reverse_origin: &str) -> Option<[u8; 3]> {
    let labels = reverse_origin
        .to_ascii_lowercase()
        .strip_suffix(&format!(".{IN_ADDR_ARPA}"))?
        .split('.')
        .map(str::parse::<u8>)
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;

    match labels.as_slice() {
        [c, b, a] => Some([*a, *b, *c]),
        _ => None,
    }
}

/// Hosts whose address falls outside the `/24` described by the reverse
/// origin. Their PTR records are still rendered; the caller reports them.
#[must_use]
pub fn reverse_mismatches(doc: &ZoneDocument) -> Vec<&HostRecord> {
    let Some(network) = reverse_network(&doc.reverse_origin) else {
        return Vec::new();
    };

    doc.records
        .iter()
        .filter(|r| !in_network(r.ipv4, network))
        .collect()
}

fn in_network(ip: Ipv4Addr, network: [u8; 3]) -> bool {
    ip.octets()[..3] == network
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
