// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Staging rendered zone text in temporary files.
//!
//! Rendered zones are never written to their live path. They are written to a
//! hidden temporary file in the same directory as the live file, so that the
//! later promotion is a same-filesystem `rename(2)`. A staged file that is
//! dropped without being promoted deletes itself.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::ZONE_FILE_PREFIX;
use crate::errors::RenderError;

/// Live path of the zone file for `origin` (`<zones_dir>/db.<origin>`).
#[must_use]
pub fn live_zone_path(zones_dir: &Path, origin: &str) -> PathBuf {
    zones_dir.join(format!("{ZONE_FILE_PREFIX}{origin}"))
}

/// A rendered zone written to a temporary file, waiting to be validated and
/// promoted.
#[derive(Debug)]
pub struct StagedZone {
    origin: String,
    live_path: PathBuf,
    text: String,
    file: NamedTempFile,
}

impl StagedZone {
    /// Zone origin (e.g. `devops.lab`).
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Path of the temporary file holding the staged text.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Path this zone will be promoted to.
    #[must_use]
    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    /// Staged zone text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the staged zone, handing the temporary file to the deployer.
    #[must_use]
    pub fn into_parts(self) -> (String, PathBuf, NamedTempFile) {
        (self.origin, self.live_path, self.file)
    }
}

/// Write `text` to a fresh hidden temporary file beside `live_path`.
///
/// The file content is flushed and synced before returning, so whatever is
/// validated is exactly what would be promoted.
///
/// # Errors
///
/// Returns [`RenderError::Staging`] if the directory cannot be created or the
/// file cannot be written.
pub fn stage_zone(origin: &str, text: String, live_path: &Path) -> Result<StagedZone, RenderError> {
    let dir = live_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let staging_error = |source: std::io::Error| RenderError::Staging {
        zone: origin.to_string(),
        dir: dir.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(staging_error)?;

    let mut file = tempfile::Builder::new()
        .prefix(&format!(".{ZONE_FILE_PREFIX}{origin}."))
        .suffix(".staged")
        .tempfile_in(dir)
        .map_err(staging_error)?;

    file.write_all(text.as_bytes()).map_err(staging_error)?;
    file.as_file().sync_all().map_err(staging_error)?;

    debug!(
        zone = %origin,
        staged = %file.path().display(),
        live = %live_path.display(),
        bytes = text.len(),
        "Staged zone file"
    );

    Ok(StagedZone {
        origin: origin.to_string(),
        live_path: live_path.to_path_buf(),
        text,
        file,
    })
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod stage_tests;
