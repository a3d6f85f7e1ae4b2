// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reading back deployed zone files.
//!
//! Only two facts are ever read from a live zone: its SOA serial (to allocate
//! the next one) and its A records (the monitor's ground truth). This is a
//! small reader for BIND master files, not a full parser.

use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::types::DeployedHost;
use crate::errors::RenderError;

const CLASSES: [&str; 3] = ["IN", "CH", "HS"];

fn strip_comment(line: &str) -> &str {
    line.split_once(';').map_or(line, |(data, _)| data)
}

/// Extract the SOA serial from zone text, if an SOA record is present.
///
/// Handles both single-line and parenthesised multi-line SOA records.
#[must_use]
pub fn extract_serial(zone_text: &str) -> Option<String> {
    let tokens: Vec<&str> = zone_text
        .lines()
        .map(strip_comment)
        .flat_map(str::split_whitespace)
        .collect();

    let soa = tokens.iter().position(|t| t.eq_ignore_ascii_case("SOA"))?;

    // SOA <mname> <rname> [(] <serial> ...
    tokens
        .iter()
        .skip(soa + 3)
        .map(|t| t.trim_matches(|c| c == '(' || c == ')'))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Read the SOA serial of the zone file at `path`.
///
/// Returns `Ok(None)` when the file does not exist (first deployment) or has
/// no SOA record.
///
/// # Errors
///
/// Returns [`RenderError::ReadDeployed`] if the file exists but cannot be read.
pub fn read_deployed_serial(path: &Path) -> Result<Option<String>, RenderError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(extract_serial(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::ReadDeployed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Origin named by the first `$ORIGIN` directive, without its trailing dot.
#[must_use]
pub fn extract_origin(zone_text: &str) -> Option<String> {
    zone_text.lines().find_map(|line| {
        let mut tokens = strip_comment(line).split_whitespace();
        let directive = tokens.next()?;
        if !directive.eq_ignore_ascii_case("$ORIGIN") {
            return None;
        }
        tokens
            .next()
            .map(|origin| origin.trim_end_matches('.').to_string())
            .filter(|origin| !origin.is_empty())
    })
}

fn is_ttl(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn is_class(token: &str) -> bool {
    CLASSES.iter().any(|c| token.eq_ignore_ascii_case(c))
}

/// Extract every `(owner, address)` pair from the A records of zone text.
///
/// A line qualifies when it starts with an explicit owner name and its type
/// field, after an optional TTL and class, is `A`. Directives, comments, and
/// continuation lines are ignored, as are A records whose address is not a
/// valid IPv4 dotted quad.
#[must_use]
pub fn extract_a_records(zone_text: &str) -> Vec<DeployedHost> {
    let mut hosts = Vec::new();

    for raw in zone_text.lines() {
        if raw.starts_with(char::is_whitespace) || raw.starts_with('$') {
            continue;
        }

        let tokens: Vec<&str> = strip_comment(raw).split_whitespace().collect();
        let Some((owner, rest)) = tokens.split_first() else {
            continue;
        };

        let Some(type_index) = rest
            .iter()
            .position(|t| !(is_ttl(t) || is_class(t)))
        else {
            continue;
        };

        if type_index > 2 || !rest[type_index].eq_ignore_ascii_case("A") {
            continue;
        }

        let Some(address) = rest.get(type_index + 1) else {
            continue;
        };

        match Ipv4Addr::from_str(address) {
            Ok(expected_ip) => hosts.push(DeployedHost {
                hostname: (*owner).to_string(),
                expected_ip,
            }),
            Err(_) => debug!(owner = %owner, address = %address, "Skipping A record with invalid address"),
        }
    }

    hosts
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod parse_tests;
