// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end zone generation, deployment and scheduled backups.
//!
//! `generate` and `deploy` share the same strictly ordered front half:
//!
//! ```text
//! parse inventory -> allocate serial -> render -> stage -> validate
//! ```
//!
//! `generate` stops there and discards the staged files. `deploy` hands the
//! validated pair to the [`Deployer`]. Nothing live is written before
//! validation has passed for both zones.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::backup::{BackupArchive, BackupManager};
use crate::bind9::{validate_staged, ServiceController, ZoneChecker};
use crate::config::{Config, SoaConfig};
use crate::constants::{BACKUP_CATEGORY_CONFIG, BACKUP_CATEGORY_ZONES};
use crate::deploy::{DeployOutcome, Deployer};
use crate::errors::{BackupError, PipelineError};
use crate::inventory::parse_inventory;
use crate::metrics;
use crate::report::Report;
use crate::serial::{next_serial, today_stamp};
use crate::zone::{
    live_zone_path, normalize_origin, qualify_name, read_deployed_serial, render_forward,
    render_reverse, reverse_mismatches, stage_zone, SoaData, StagedZone, ZoneDocument,
};

/// Inputs of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRequest {
    pub inventory: PathBuf,
    pub forward_zone: String,
    pub reverse_zone: String,
}

/// What a generation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSummary {
    pub forward_origin: String,
    pub reverse_origin: String,
    /// Highest serial found in the deployed pair, if any
    pub previous_serial: Option<String>,
    pub serial: u32,
    pub hosts: usize,
    pub forward_text: String,
    pub reverse_text: String,
}

/// A validated zone pair ready for promotion.
#[derive(Debug)]
pub struct PreparedZones {
    pub summary: ZoneSummary,
    pub forward: StagedZone,
    pub reverse: StagedZone,
}

/// Result of a deploy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub summary: ZoneSummary,
    pub outcome: DeployOutcome,
}

/// Runs generation and deployment against one zones directory.
#[derive(Clone)]
pub struct Pipeline {
    zones_dir: PathBuf,
    soa: SoaConfig,
    checker: Arc<dyn ZoneChecker>,
    deployer: Deployer,
    today: Option<String>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        config: &Config,
        checker: Arc<dyn ZoneChecker>,
        service: Arc<dyn ServiceController>,
    ) -> Self {
        Self {
            zones_dir: config.zones_dir.clone(),
            soa: config.soa.clone(),
            checker,
            deployer: Deployer::new(
                BackupManager::new(&config.backup_root),
                service,
                config.zone_file_mode,
                config.retention.zones_days,
            ),
            today: None,
        }
    }

    /// Pin the calendar date used for serial allocation (`YYYYMMDD`).
    #[must_use]
    pub fn with_today(mut self, today: impl Into<String>) -> Self {
        self.today = Some(today.into());
        self
    }

    /// Parse, allocate, render, stage and validate.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the first failing phase. Staged files
    /// are removed on every error path.
    pub async fn prepare(
        &self,
        request: &ZoneRequest,
        report: &mut Report,
    ) -> Result<PreparedZones, PipelineError> {
        let forward_origin = normalize_origin(&request.forward_zone)?;
        let reverse_origin = normalize_origin(&request.reverse_zone)?;

        let records = parse_inventory(&request.inventory)?;
        report.info(format!(
            "Parsed {} host record(s) from {}",
            records.len(),
            request.inventory.display()
        ));

        let forward_live = live_zone_path(&self.zones_dir, &forward_origin);
        let reverse_live = live_zone_path(&self.zones_dir, &reverse_origin);

        let today = self.today.clone().unwrap_or_else(today_stamp);
        let (previous_serial, serial) =
            allocate_serial(&[&forward_live, &reverse_live], &today)?;
        report.info(format!(
            "Serial {} -> {serial}",
            previous_serial.as_deref().unwrap_or("none")
        ));

        let doc = ZoneDocument {
            soa: SoaData {
                serial,
                ttl: self.soa.ttl,
                primary_ns: qualify_name(&self.soa.primary_ns, &forward_origin)?,
                admin_contact: qualify_name(&self.soa.admin_contact, &forward_origin)?,
            },
            origin: forward_origin.clone(),
            reverse_origin: reverse_origin.clone(),
            name_server_ip: self.soa.name_server_ip,
            records,
        };

        for host in reverse_mismatches(&doc) {
            report.warn(format!(
                "Host {} ({}) is outside reverse zone {}; its PTR is published as {}.{} and answers for the wrong address",
                host.hostname, host.ipv4, doc.reverse_origin, host.ipv4.octets()[3], doc.reverse_origin
            ));
        }

        let forward_text = render_forward(&doc);
        let reverse_text = render_reverse(&doc);
        metrics::record_zone(&forward_origin, serial, doc.records.len());

        let forward = stage_zone(&forward_origin, forward_text.clone(), &forward_live)?;
        let reverse = stage_zone(&reverse_origin, reverse_text.clone(), &reverse_live)?;

        validate_staged(self.checker.as_ref(), &[&forward, &reverse], report).await?;

        Ok(PreparedZones {
            summary: ZoneSummary {
                forward_origin,
                reverse_origin,
                previous_serial,
                serial,
                hosts: doc.records.len(),
                forward_text,
                reverse_text,
            },
            forward,
            reverse,
        })
    }

    /// Generate and validate a zone pair without deploying it.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::prepare`].
    pub async fn generate(
        &self,
        request: &ZoneRequest,
        report: &mut Report,
    ) -> Result<ZoneSummary, PipelineError> {
        let prepared = self.prepare(request, report).await?;
        report.info(format!(
            "Generated {} and {} (serial {}), staged files discarded",
            prepared.summary.forward_origin, prepared.summary.reverse_origin, prepared.summary.serial
        ));
        Ok(prepared.summary)
    }

    /// Generate, validate, back up and deploy a zone pair.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::prepare`] and [`Deployer::deploy`].
    pub async fn deploy(
        &self,
        request: &ZoneRequest,
        dry_run: bool,
        report: &mut Report,
    ) -> Result<DeployReport, PipelineError> {
        let PreparedZones {
            summary,
            forward,
            reverse,
        } = self.prepare(request, report).await?;

        let outcome = self
            .deployer
            .deploy(forward, reverse, dry_run, report)
            .await?;

        Ok(DeployReport { summary, outcome })
    }
}

/// Next serial for a zone pair: one that is strictly greater than the serial
/// of every deployed file in `live_paths`.
fn allocate_serial(
    live_paths: &[&Path],
    today: &str,
) -> Result<(Option<String>, u32), PipelineError> {
    let mut previous: Option<(u32, String)> = None;
    let mut serial = next_serial("", today)?;

    for path in live_paths {
        let Some(existing) = read_deployed_serial(path)? else {
            debug!(path = %path.display(), "No deployed serial");
            continue;
        };
        let candidate = next_serial(&existing, today)?;
        serial = serial.max(candidate);

        let value = existing.trim().parse::<u32>().unwrap_or_default();
        if previous.as_ref().map_or(true, |(v, _)| value > *v) {
            previous = Some((value, existing));
        }
    }

    Ok((previous.map(|(_, text)| text), serial))
}

/// Which backup categories a `backup` run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackupScope {
    /// Live zone files
    Zones,
    /// The full BIND configuration tree
    Config,
    /// Both
    All,
}

/// One category to archive and prune.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub category: &'static str,
    pub sources: Vec<PathBuf>,
    pub retention_days: u32,
}

/// Targets covered by `scope` under `config`.
#[must_use]
pub fn backup_targets(config: &Config, scope: BackupScope) -> Vec<BackupTarget> {
    let zones = BackupTarget {
        category: BACKUP_CATEGORY_ZONES,
        sources: vec![config.zones_dir.clone()],
        retention_days: config.retention.zones_days,
    };
    let bind_config = BackupTarget {
        category: BACKUP_CATEGORY_CONFIG,
        sources: vec![config.bind_config_dir.clone()],
        retention_days: config.retention.config_days,
    };

    match scope {
        BackupScope::Zones => vec![zones],
        BackupScope::Config => vec![bind_config],
        BackupScope::All => vec![zones, bind_config],
    }
}

/// Archive and prune every target.
///
/// Each target is archived, then its retention window is applied. All
/// targets are attempted; the first error is returned after the rest ran.
///
/// # Errors
///
/// Returns the first [`BackupError`] encountered.
pub fn run_backup(
    manager: &BackupManager,
    targets: &[BackupTarget],
    dry_run: bool,
    report: &mut Report,
) -> Result<Vec<BackupArchive>, PipelineError> {
    let mut archives = Vec::new();
    let mut first_error: Option<BackupError> = None;

    for target in targets {
        if dry_run {
            for source in &target.sources {
                let state = if source.exists() { "would archive" } else { "missing" };
                report.info(format!(
                    "Dry run: {} {state} {} (retention {} days)",
                    target.category,
                    source.display(),
                    target.retention_days
                ));
            }
            continue;
        }

        match manager.backup(target.category, &target.sources) {
            Ok(archive) => {
                metrics::record_backup(target.category, true);
                report.info(format!(
                    "Backed up {} to {} ({} entries verified, sha256 {})",
                    target.category,
                    archive.path.display(),
                    archive.entries,
                    archive.sha256
                ));
                archives.push(archive);
            }
            Err(e) => {
                metrics::record_backup(target.category, false);
                report.error(format!("Backup of {} failed: {e}", target.category));
                first_error.get_or_insert(e);
                continue;
            }
        }

        let now = chrono::Local::now().naive_local();
        match manager.apply_retention(target.category, target.retention_days, now) {
            Ok(removed) => {
                metrics::record_backups_pruned(target.category, removed.len());
                report.info(format!(
                    "Retention removed {} {} archive(s) older than {} days",
                    removed.len(),
                    target.category,
                    target.retention_days
                ));
            }
            Err(e) => {
                report.error(format!("Retention for {} failed: {e}", target.category));
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(archives),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;
