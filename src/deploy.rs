// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Atomic promotion of validated zone files.
//!
//! The deployer is the only writer of live zone files. A deployment runs in
//! three strictly ordered phases:
//!
//! 1. **Backup** - the currently live files (if any) are archived and
//!    verified, then archives older than the zones retention window are
//!    pruned. A failed backup stops the deployment before anything live is
//!    touched.
//! 2. **Replace** - each staged file is given its final mode and renamed onto
//!    its live path. The reverse zone is promoted first, then the forward
//!    zone, so the forward zone never advertises hosts whose PTR records are
//!    not live yet.
//! 3. **Reload** - the name server is told to load the new files. A failed
//!    reload is a warning: the files are valid and already live.
//!
//! In dry-run mode all three phases are skipped and the staged files are
//! discarded.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backup::{BackupArchive, BackupManager};
use crate::bind9::ServiceController;
use crate::constants::BACKUP_CATEGORY_ZONES;
use crate::errors::{BackupError, DeployError, PipelineError};
use crate::metrics;
use crate::report::Report;
use crate::zone::StagedZone;

/// What a deployment did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Archive of the replaced files, if any were live
    pub backup: Option<BackupArchive>,
    /// Live paths replaced, in promotion order
    pub deployed: Vec<PathBuf>,
    /// Whether the reload succeeded (false when skipped)
    pub reload_ok: bool,
    pub dry_run: bool,
}

/// Backs up, promotes and reloads validated zones.
#[derive(Clone)]
pub struct Deployer {
    backups: BackupManager,
    service: Arc<dyn ServiceController>,
    zone_file_mode: u32,
    retention_days: u32,
}

impl Deployer {
    /// `retention_days` is the zones retention window applied after each
    /// deploy-time backup.
    #[must_use]
    pub fn new(
        backups: BackupManager,
        service: Arc<dyn ServiceController>,
        zone_file_mode: u32,
        retention_days: u32,
    ) -> Self {
        Self {
            backups,
            service,
            zone_file_mode,
            retention_days,
        }
    }

    /// Deploy a validated forward/reverse pair.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Backup`] if the live files could not be backed
    /// up (nothing is replaced), or [`PipelineError::Deploy`] if a rename
    /// failed. A failed reload is not an error.
    pub async fn deploy(
        &self,
        forward: StagedZone,
        reverse: StagedZone,
        dry_run: bool,
        report: &mut Report,
    ) -> Result<DeployOutcome, PipelineError> {
        if dry_run {
            for staged in [&reverse, &forward] {
                report.info(format!(
                    "Dry run: would replace {} (backup, replace and reload skipped)",
                    staged.live_path().display()
                ));
            }
            metrics::record_deploy("dry_run");
            return Ok(DeployOutcome {
                backup: None,
                deployed: Vec::new(),
                reload_ok: false,
                dry_run: true,
            });
        }

        let backup = match self.backup_live(&[&forward, &reverse], report) {
            Ok(backup) => backup,
            Err(e) => {
                metrics::record_deploy("failed");
                return Err(e.into());
            }
        };

        let mut deployed = Vec::with_capacity(2);
        for staged in [reverse, forward] {
            match self.promote(staged, report) {
                Ok(path) => deployed.push(path),
                Err(e) => {
                    if !deployed.is_empty() {
                        report.error(format!(
                            "Partial deployment: {} is live but the forward zone was not replaced",
                            deployed
                                .iter()
                                .map(|p| p.display().to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ));
                    }
                    metrics::record_deploy("failed");
                    return Err(e.into());
                }
            }
        }
        metrics::record_deploy("deployed");

        let reload_ok = self.reload(report).await;

        Ok(DeployOutcome {
            backup,
            deployed,
            reload_ok,
            dry_run: false,
        })
    }

    /// Archive whichever live files the staged zones would replace.
    ///
    /// Returns `None` when none of them exist yet (first deployment).
    ///
    /// # Errors
    ///
    /// Returns a [`BackupError`] if the archive cannot be written or verified.
    pub fn backup_live(
        &self,
        staged: &[&StagedZone],
        report: &mut Report,
    ) -> Result<Option<BackupArchive>, BackupError> {
        let live: Vec<PathBuf> = staged
            .iter()
            .map(|s| s.live_path().to_path_buf())
            .filter(|p| p.exists())
            .collect();

        if live.is_empty() {
            report.info("No live zone files yet, nothing to back up");
            return Ok(None);
        }

        match self.backups.backup(BACKUP_CATEGORY_ZONES, &live) {
            Ok(archive) => {
                metrics::record_backup(BACKUP_CATEGORY_ZONES, true);
                report.info(format!(
                    "Backed up {} live zone file(s) to {} ({} entries verified)",
                    archive.source_paths.len(),
                    archive.path.display(),
                    archive.entries
                ));
                self.prune_backups(chrono::Local::now().naive_local(), report);
                Ok(Some(archive))
            }
            Err(e) => {
                metrics::record_backup(BACKUP_CATEGORY_ZONES, false);
                report.error(format!("Backup failed, deployment aborted: {e}"));
                Err(e)
            }
        }
    }

    /// Apply the zones retention window to deploy-time archives.
    ///
    /// A pruning failure is a warning; the fresh archive is already verified.
    pub fn prune_backups(&self, now: NaiveDateTime, report: &mut Report) -> usize {
        match self
            .backups
            .apply_retention(BACKUP_CATEGORY_ZONES, self.retention_days, now)
        {
            Ok(removed) => {
                metrics::record_backups_pruned(BACKUP_CATEGORY_ZONES, removed.len());
                report.info(format!(
                    "Retention removed {} {BACKUP_CATEGORY_ZONES} archive(s) older than {} days",
                    removed.len(),
                    self.retention_days
                ));
                removed.len()
            }
            Err(e) => {
                report.warn(format!("Retention for {BACKUP_CATEGORY_ZONES} failed: {e}"));
                0
            }
        }
    }

    /// Rename one staged zone onto its live path.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Replace`] if the mode cannot be set or the rename
    /// fails. The live file is untouched in that case.
    pub fn promote(&self, staged: StagedZone, report: &mut Report) -> Result<PathBuf, DeployError> {
        let (origin, live_path, file) = staged.into_parts();
        let replace_error = |source: std::io::Error| DeployError::Replace {
            path: live_path.clone(),
            source,
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(self.zone_file_mode))
                .map_err(replace_error)?;
        }

        if let Err(e) = file.persist(&live_path) {
            let err = replace_error(e.error);
            report.error(format!("Failed to replace zone {origin}: {err}"));
            return Err(err);
        }

        sync_parent(&live_path);
        report.info(format!("Deployed zone {origin} to {}", live_path.display()));
        Ok(live_path)
    }

    /// Ask the name server to reload. Returns whether it succeeded.
    pub async fn reload(&self, report: &mut Report) -> bool {
        match self.service.reload().await {
            Ok(()) => {
                metrics::record_reload(true);
                report.info(format!("Name server reloaded ({})", self.service.describe()));
                true
            }
            Err(e) => {
                metrics::record_reload(false);
                report.warn(format!(
                    "Name server reload failed, new zone files are deployed but not loaded: {e}"
                ));
                false
            }
        }
    }
}

/// Flush the directory entry of a rename to disk.
fn sync_parent(path: &Path) {
    let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    match std::fs::File::open(dir).and_then(|d| d.sync_all()) {
        Ok(()) => debug!(dir = %dir.display(), "Synced zone directory"),
        Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to sync zone directory"),
    }
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod deploy_tests;
