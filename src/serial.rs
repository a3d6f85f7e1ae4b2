// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SOA serial allocation.
//!
//! Serials follow the date-versioning convention `YYYYMMDDnn`: the calendar
//! date of the generation followed by a two-digit same-day sequence starting
//! at `01`.
//!
//! - No deployed zone: `today || 01`
//! - Deployed serial starts with today's date: `existing + 1`
//! - Otherwise: `today || 01`
//!
//! Two situations the plain rule would get wrong are handled explicitly:
//! the 100th regeneration on one day is rejected instead of spilling into the
//! next day's range, and a deployed serial that is already ahead of today
//! (clock skew, or a hand-edited zone) is bumped by one so the new serial is
//! still strictly greater.

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::constants::{SERIAL_DATE_LEN, SERIAL_FIRST_SEQUENCE, SERIAL_MAX_SEQUENCE};
use crate::errors::SerialError;

/// Today's date in `YYYYMMDD` form, local time.
#[must_use]
pub fn today_stamp() -> String {
    date_stamp(Local::now().date_naive())
}

/// Format a date as `YYYYMMDD`.
#[must_use]
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Compute the serial that follows `existing` on `today`.
///
/// `existing` is the SOA serial of the deployed zone as text, or an empty
/// string when no zone is deployed yet. `today` must be eight ASCII digits.
///
/// # Examples
///
/// ```
/// use zonekeeper::serial::next_serial;
///
/// assert_eq!(next_serial("", "20261018").unwrap(), 2026101801);
/// assert_eq!(next_serial("2026101801", "20261018").unwrap(), 2026101802);
/// assert_eq!(next_serial("2026101707", "20261018").unwrap(), 2026101801);
/// ```
///
/// # Errors
///
/// Returns a [`SerialError`] if `today` is malformed, `existing` is not a
/// decimal `u32`, the same-day sequence is exhausted, or the increment would
/// overflow.
pub fn next_serial(existing: &str, today: &str) -> Result<u32, SerialError> {
    if today.len() != SERIAL_DATE_LEN || !today.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SerialError::InvalidDate {
            value: today.to_string(),
        });
    }

    let first_of_day: u32 = format!("{today}{SERIAL_FIRST_SEQUENCE:02}")
        .parse()
        .map_err(|_| SerialError::InvalidDate {
            value: today.to_string(),
        })?;

    let existing = existing.trim();
    if existing.is_empty() {
        debug!(serial = first_of_day, "No deployed serial, starting today's sequence");
        return Ok(first_of_day);
    }

    let current: u32 = existing
        .parse()
        .map_err(|_| SerialError::InvalidExisting {
            value: existing.to_string(),
        })?;

    if let Some(sequence) = existing.strip_prefix(today) {
        let sequence: u32 = sequence.parse().unwrap_or(0);
        if sequence >= SERIAL_MAX_SEQUENCE {
            return Err(SerialError::SequenceExhausted {
                date: today.to_string(),
            });
        }
        return increment(current);
    }

    if current >= first_of_day {
        warn!(
            existing = current,
            today = %today,
            "Deployed serial is ahead of today's date, incrementing it instead"
        );
        return increment(current);
    }

    Ok(first_of_day)
}

fn increment(serial: u32) -> Result<u32, SerialError> {
    serial
        .checked_add(1)
        .ok_or(SerialError::Overflow { value: serial })
}

#[cfg(test)]
#[path = "serial_tests.rs"]
mod serial_tests;
