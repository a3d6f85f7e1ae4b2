// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Host inventory parsing.
//!
//! The inventory is a comma-delimited text file whose first line must be
//! exactly `hostname,ip,type,alias`. Each following line describes one host:
//!
//! ```text
//! hostname,ip,type,alias
//! web,192.168.1.10,A,www
//! db,192.168.1.20,A,
//! ```
//!
//! Parsing is all-or-nothing. Any malformed row fails the whole inventory with
//! an [`InventoryError`] naming the row and field, because a silently dropped
//! row is a silently missing DNS record.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::constants::{INVENTORY_DELIMITER, INVENTORY_HEADER, RECORD_TYPE_A};
use crate::errors::InventoryError;
use crate::zone::{HostRecord, RecordType};

/// Number of columns in the inventory header.
const INVENTORY_COLUMNS: usize = 4;

/// Parse the inventory file at `path`.
///
/// # Errors
///
/// Returns an [`InventoryError`] if the file cannot be read or any row is invalid.
pub fn parse_inventory(path: &Path) -> Result<Vec<HostRecord>, InventoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_inventory_str(&content)?;
    debug!(
        path = %path.display(),
        hosts = records.len(),
        "Parsed host inventory"
    );
    Ok(records)
}

/// Parse inventory text.
///
/// Blank lines are ignored. Fields are trimmed of surrounding whitespace and
/// carriage returns. Hostnames and aliases share one namespace and are compared
/// case-insensitively, as DNS owner names are.
///
/// # Errors
///
/// Returns an [`InventoryError`] for a missing or malformed header, a row with
/// the wrong number of fields, an empty `hostname`, `ip` or `type`, an address
/// that is not an IPv4 dotted quad, a record type other than `A`, or a name
/// already used by an earlier row.
pub fn parse_inventory_str(content: &str) -> Result<Vec<HostRecord>, InventoryError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().enumerate();

    let header = lines
        .next()
        .map(|(_, line)| line.trim())
        .ok_or(InventoryError::Empty {
            expected: INVENTORY_HEADER,
        })?;

    if header != INVENTORY_HEADER {
        return Err(InventoryError::MalformedHeader {
            found: header.to_string(),
            expected: INVENTORY_HEADER,
        });
    }

    let mut records = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, raw) in lines {
        let line = index + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let record = parse_row(raw, line)?;

        claim_name(&mut seen, &record.hostname, "hostname", line)?;
        if let Some(alias) = &record.alias {
            claim_name(&mut seen, alias, "alias", line)?;
        }

        records.push(record);
    }

    Ok(records)
}

fn parse_row(raw: &str, line: usize) -> Result<HostRecord, InventoryError> {
    let fields: Vec<&str> = raw
        .split(INVENTORY_DELIMITER)
        .map(|f| f.trim_matches(|c: char| c.is_whitespace() || c == '\r'))
        .collect();

    // The trailing alias column may be omitted entirely
    if fields.len() < INVENTORY_COLUMNS - 1 || fields.len() > INVENTORY_COLUMNS {
        return Err(InventoryError::WrongFieldCount {
            line,
            expected: INVENTORY_COLUMNS,
            found: fields.len(),
        });
    }

    let hostname = required(&fields, 0, "hostname", line)?;
    let ip = required(&fields, 1, "ip", line)?;
    let record_type = required(&fields, 2, "type", line)?;

    let record_type = match record_type {
        RECORD_TYPE_A => RecordType::A,
        other => {
            return Err(InventoryError::UnsupportedRecordType {
                line,
                value: other.to_string(),
            })
        }
    };

    let ipv4 = parse_dotted_quad(ip).ok_or_else(|| InventoryError::InvalidAddress {
        line,
        value: ip.to_string(),
    })?;

    let alias = fields
        .get(3)
        .filter(|a| !a.is_empty())
        .map(|a| (*a).to_string());

    Ok(HostRecord {
        hostname: hostname.to_string(),
        ipv4,
        record_type,
        alias,
    })
}

fn required<'a>(
    fields: &[&'a str],
    index: usize,
    field: &'static str,
    line: usize,
) -> Result<&'a str, InventoryError> {
    match fields.get(index) {
        Some(value) if !value.is_empty() => Ok(*value),
        _ => Err(InventoryError::EmptyField { line, field }),
    }
}

fn claim_name(
    seen: &mut HashMap<String, usize>,
    name: &str,
    field: &'static str,
    line: usize,
) -> Result<(), InventoryError> {
    let key = name.to_ascii_lowercase();
    if let Some(&first_line) = seen.get(&key) {
        return Err(InventoryError::DuplicateName {
            line,
            field,
            name: name.to_string(),
            first_line,
        });
    }
    seen.insert(key, line);
    Ok(())
}

/// Parse a strict IPv4 dotted quad (four decimal octets, each 0-255).
#[must_use]
pub fn parse_dotted_quad(value: &str) -> Option<Ipv4Addr> {
    // `Ipv4Addr::from_str` already rejects shorthand forms, CIDR suffixes,
    // out-of-range octets and leading zeros.
    Ipv4Addr::from_str(value).ok()
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod inventory_tests;
