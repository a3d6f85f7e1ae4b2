// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use zonekeeper::pipeline::BackupScope;

/// zonekeeper -- generate, validate, deploy and monitor BIND zones
#[derive(Debug, Parser)]
#[command(
    name = "zonekeeper",
    version,
    about = "Generate, validate, deploy and monitor BIND zones from a host inventory",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (default: /etc/zonekeeper/config.yaml, optional)
    #[arg(long, short = 'c', env = "ZONEKEEPER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long, env = "ZONEKEEPER_METRICS_FILE", global = true)]
    pub metrics_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render and validate zones without deploying them
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Render, validate, back up and deploy zones, then reload the name server
    Deploy(DeployArgs),

    /// Archive zone files and/or BIND configuration and apply retention
    Backup(BackupArgs),

    /// Check deployed hosts against a live resolver
    #[command(alias = "mon")]
    Monitor(MonitorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Inputs shared by `generate` and `deploy`.
#[derive(Debug, Args)]
pub struct ZoneArgs {
    /// Inventory CSV (`hostname,ip,type,alias`)
    #[arg(long, short = 'i')]
    pub inventory: PathBuf,

    /// Forward zone origin (e.g. devops.lab)
    #[arg(long, short = 'f')]
    pub forward_zone: String,

    /// Reverse zone origin (e.g. 1.168.192.in-addr.arpa)
    #[arg(long, short = 'r')]
    pub reverse_zone: String,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub zone: ZoneArgs,

    /// Print the rendered zones to stdout
    #[arg(long)]
    pub print: bool,
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub zone: ZoneArgs,

    /// Generate and validate only; skip backup, replace and reload
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// What to archive
    #[arg(long, value_enum, default_value = "all")]
    pub category: BackupScope,

    /// Show what would be archived without writing anything
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Resolver to query (overrides monitor.server)
    #[arg(long, short = 's')]
    pub server: Option<IpAddr>,

    /// Resolver port (overrides monitor.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Deployed forward zone file to take hosts from
    #[arg(long, conflicts_with = "forward_zone")]
    pub zone_file: Option<PathBuf>,

    /// Forward zone origin; its file is read from the zones directory
    #[arg(long, short = 'f', required_unless_present = "zone_file")]
    pub forward_zone: Option<String>,

    /// Latency above which a host is reported as WARN
    #[arg(long)]
    pub latency_threshold_ms: Option<u64>,

    /// Per-query timeout
    #[arg(long)]
    pub query_timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
