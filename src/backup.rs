// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Timestamped, verified backup archives.
//!
//! Archives are gzip-compressed tarballs named `<category>-YYYYMMDD-HHMMSS.tar.gz`
//! and stored under `<backup_root>/<category>/`. An archive only counts as a
//! backup once it has been read back end to end; an archive that fails the
//! read-back is deleted and reported as a [`BackupError::Verification`].
//!
//! Every verified archive gets a `.sha256` sidecar in `sha256sum` format.
//!
//! The backup manager treats its sources as opaque bytes. It never parses zone
//! content.

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{
    BACKUP_ARCHIVE_EXTENSION, BACKUP_CHECKSUM_EXTENSION, BACKUP_FILE_MODE,
    BACKUP_TIMESTAMP_FORMAT,
};
use crate::errors::BackupError;

/// Length of a `YYYYMMDD-HHMMSS` timestamp.
const TIMESTAMP_LEN: usize = 15;

/// A written and verified backup archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArchive {
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    /// Source paths that existed and were archived
    pub source_paths: Vec<PathBuf>,
    /// Set only after a full read-back succeeded
    pub verified_readable: bool,
    /// Number of tar entries read back
    pub entries: usize,
    /// Hex SHA-256 of the archive bytes
    pub sha256: String,
}

/// Creates archives under a backup root and prunes old ones.
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding archives of `category`.
    #[must_use]
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    /// Archive `sources` into a new timestamped archive of `category`.
    ///
    /// Sources that do not exist are skipped with a warning; directories are
    /// archived recursively. The archive is made owner-only readable and is
    /// verified before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NoSources`] if no source exists,
    /// [`BackupError::Io`] if writing fails, and
    /// [`BackupError::Verification`] if the read-back fails. No archive is
    /// left behind on error.
    pub fn backup(&self, category: &str, sources: &[PathBuf]) -> Result<BackupArchive, BackupError> {
        let existing: Vec<PathBuf> = sources
            .iter()
            .filter(|p| {
                let exists = p.exists();
                if !exists {
                    warn!(path = %p.display(), "Backup source does not exist, skipping");
                }
                exists
            })
            .cloned()
            .collect();

        if existing.is_empty() {
            return Err(BackupError::NoSources);
        }

        let dir = self.category_dir(category);
        std::fs::create_dir_all(&dir).map_err(|source| BackupError::Io {
            path: dir.clone(),
            source,
        })?;

        let created_at = Local::now();
        let (path, file) = create_archive_file(&dir, category, &created_at)?;

        let result = write_archive(file, &existing)
            .map_err(|source| BackupError::Io {
                path: path.clone(),
                source,
            })
            .and_then(|()| set_owner_only(&path))
            .and_then(|()| verify_archive(&path, &existing))
            .and_then(|entries| {
                let sha256 = write_checksum(&path)?;
                Ok((entries, sha256))
            });

        let (entries, sha256) = match result {
            Ok(ok) => ok,
            Err(e) => {
                remove_archive(&path);
                return Err(e);
            }
        };

        info!(
            archive = %path.display(),
            category = %category,
            sources = existing.len(),
            entries = entries,
            "Backup archive written and verified"
        );

        Ok(BackupArchive {
            path,
            created_at,
            source_paths: existing,
            verified_readable: true,
            entries,
            sha256,
        })
    }

    /// Delete archives of `category` older than `max_age_days`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the category directory cannot be listed
    /// or an expired archive cannot be removed.
    pub fn apply_retention(
        &self,
        category: &str,
        max_age_days: u32,
        now: NaiveDateTime,
    ) -> Result<Vec<PathBuf>, BackupError> {
        apply_retention(&self.category_dir(category), category, max_age_days, now)
    }
}

fn archive_name(category: &str, created_at: &DateTime<Local>, attempt: usize) -> String {
    let stamp = created_at.format(BACKUP_TIMESTAMP_FORMAT);
    if attempt == 0 {
        format!("{category}-{stamp}.{BACKUP_ARCHIVE_EXTENSION}")
    } else {
        format!("{category}-{stamp}-{attempt}.{BACKUP_ARCHIVE_EXTENSION}")
    }
}

/// Create a new archive file, never overwriting an earlier one from the same second.
fn create_archive_file(
    dir: &Path,
    category: &str,
    created_at: &DateTime<Local>,
) -> Result<(PathBuf, File), BackupError> {
    let mut attempt = 0;
    loop {
        let path = dir.join(archive_name(category, created_at, attempt));
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(BACKUP_FILE_MODE);
        }

        match options.open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(BackupError::Io { path, source }),
        }
    }
}

/// Path a source is stored under inside the archive (absolute paths lose their root).
fn archive_entry_name(source: &Path) -> PathBuf {
    source
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect()
}

fn write_archive(file: File, sources: &[PathBuf]) -> io::Result<()> {
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for source in sources {
        let name = archive_entry_name(source);
        if source.is_dir() {
            builder.append_dir_all(&name, source)?;
        } else {
            builder.append_path_with_name(source, &name)?;
        }
        debug!(source = %source.display(), entry = %name.display(), "Added to archive");
    }

    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()
}

fn set_owner_only(path: &Path) -> Result<(), BackupError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(BACKUP_FILE_MODE))
            .map_err(|source| BackupError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Read an archive back end to end and check every source made it in.
///
/// Returns the number of entries read.
///
/// # Errors
///
/// Returns [`BackupError::Verification`] if the archive cannot be decoded, is
/// empty, or is missing one of `sources`.
pub fn verify_archive(path: &Path, sources: &[PathBuf]) -> Result<usize, BackupError> {
    let verification = |reason: String| BackupError::Verification {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| verification(format!("cannot open: {e}")))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut names = HashSet::new();
    let entries = archive
        .entries()
        .map_err(|e| verification(format!("cannot list entries: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| verification(format!("corrupt entry: {e}")))?;
        let name = entry
            .path()
            .map_err(|e| verification(format!("unreadable entry name: {e}")))?
            .components()
            .collect::<PathBuf>();
        io::copy(&mut entry, &mut io::sink())
            .map_err(|e| verification(format!("cannot read '{}': {e}", name.display())))?;
        names.insert(name);
    }

    if names.is_empty() {
        return Err(verification("archive has no entries".to_string()));
    }

    for source in sources {
        let expected = archive_entry_name(source);
        if !names.contains(&expected) {
            return Err(verification(format!(
                "source '{}' missing from archive",
                source.display()
            )));
        }
    }

    Ok(names.len())
}

fn checksum_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(format!(".{BACKUP_CHECKSUM_EXTENSION}"));
    PathBuf::from(name)
}

/// Hash the archive and write a `sha256sum`-style sidecar next to it.
fn write_checksum(archive: &Path) -> Result<String, BackupError> {
    let io_error = |path: &Path, source: io::Error| BackupError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut hasher = Sha256::new();
    let mut file = File::open(archive).map_err(|e| io_error(archive, e))?;
    io::copy(&mut file, &mut hasher).map_err(|e| io_error(archive, e))?;
    let digest = format!("{:x}", hasher.finalize());

    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sidecar = checksum_path(archive);
    let mut out = File::create(&sidecar).map_err(|e| io_error(&sidecar, e))?;
    writeln!(out, "{digest}  {file_name}").map_err(|e| io_error(&sidecar, e))?;
    set_owner_only(&sidecar)?;

    Ok(digest)
}

fn remove_archive(path: &Path) {
    for target in [path.to_path_buf(), checksum_path(path)] {
        if let Err(e) = std::fs::remove_file(&target) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %target.display(), error = %e, "Failed to remove archive");
            }
        }
    }
}

/// Creation time encoded in an archive name of `category`, if it is one.
fn archive_timestamp(file_name: &str, category: &str) -> Option<NaiveDateTime> {
    let rest = file_name
        .strip_prefix(category)?
        .strip_prefix('-')?
        .strip_suffix(&format!(".{BACKUP_ARCHIVE_EXTENSION}"))?;
    let stamp = rest.get(..TIMESTAMP_LEN)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}

/// Delete archives of `category` in `dir` whose timestamp is more than
/// `max_age_days` before `now`. Files that are not archives of this category
/// are left alone.
///
/// Returns the archives removed.
///
/// # Errors
///
/// Returns [`BackupError::Io`] if `dir` cannot be listed or an archive cannot
/// be removed. A missing `dir` is not an error.
pub fn apply_retention(
    dir: &Path,
    category: &str,
    max_age_days: u32,
    now: NaiveDateTime,
) -> Result<Vec<PathBuf>, BackupError> {
    let listing = match std::fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(BackupError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let max_age = TimeDelta::days(i64::from(max_age_days));
    let mut removed = Vec::new();

    for entry in listing {
        let entry = entry.map_err(|source| BackupError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();

        let Some(created) = archive_timestamp(&file_name, category) else {
            continue;
        };

        if now - created > max_age {
            std::fs::remove_file(&path).map_err(|source| BackupError::Io {
                path: path.clone(),
                source,
            })?;
            if let Err(e) = std::fs::remove_file(checksum_path(&path)) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove checksum sidecar");
                }
            }
            debug!(archive = %path.display(), created = %created, "Removed expired archive");
            removed.push(path);
        }
    }

    removed.sort();
    Ok(removed)
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod backup_tests;
