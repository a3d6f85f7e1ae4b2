// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

mod cli;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use zonekeeper::backup::BackupManager;
use zonekeeper::bind9::{CommandServiceController, HickoryResolver, NamedCheckzone};
use zonekeeper::config::Config;
use zonekeeper::errors::{exit_code, PipelineError};
use zonekeeper::metrics;
use zonekeeper::monitor::{load_deployed_zone, run_monitor, MonitorSummary};
use zonekeeper::pipeline::{backup_targets, run_backup, Pipeline, ZoneRequest};
use zonekeeper::report::Report;
use zonekeeper::zone::{live_zone_path, normalize_origin};

use crate::cli::{Cli, Command, GlobalOpts, MonitorArgs, ZoneArgs};

fn main() {
    let cli = Cli::parse();

    // Single-threaded: every phase runs strictly in order
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .thread_name("zonekeeper")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(exit_code::GENERAL);
        }
    };

    let code = runtime.block_on(async_main(cli));
    std::process::exit(code);
}

async fn async_main(cli: Cli) -> i32 {
    init_tracing(cli.global.verbose);

    if let Command::Completions(args) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(args.shell, &mut cmd, "zonekeeper", &mut std::io::stdout());
        return exit_code::SUCCESS;
    }

    let config = match load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Configuration error");
            eprintln!("Error: {e:#}");
            return exit_code::CONFIG;
        }
    };

    let operation = operation_name(&cli.command);
    let started = Instant::now();
    let mut report = Report::with_log_file(operation, &config.log_file);
    info!(operation = %operation, "Starting zonekeeper");

    let code = match run(&cli.command, &config, &mut report).await {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            report.error(format!("{operation} failed: {e:#}"));
            eprintln!("Error: {e:#}");
            code
        }
    };

    finish(&cli.global, &config, &report, code, started);
    code
}

/// Initialize logging.
///
/// `-v`/`-vv` select `debug`/`trace`; otherwise `RUST_LOG` applies, defaulting
/// to `info`. `RUST_LOG_FORMAT=json` switches to JSON output. Logs go to
/// stderr so that `--print` output on stdout stays clean.
fn init_tracing(verbosity: u8) {
    let env_filter = match verbosity {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        1 => tracing_subscriber::EnvFilter::new("debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!("Logging initialized with file and line number tracking");
}

fn load_config(global: &GlobalOpts) -> Result<Config> {
    let config = Config::load(global.config.as_deref())?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn operation_name(command: &Command) -> &'static str {
    match command {
        Command::Generate(_) => "generate",
        Command::Deploy(_) => "deploy",
        Command::Backup(_) => "backup",
        Command::Monitor(_) => "monitor",
        Command::Completions(_) => "completions",
    }
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(pipeline) = error.downcast_ref::<PipelineError>() {
        return pipeline.exit_code();
    }
    exit_code::GENERAL
}

fn zone_request(args: &ZoneArgs) -> ZoneRequest {
    ZoneRequest {
        inventory: args.inventory.clone(),
        forward_zone: args.forward_zone.clone(),
        reverse_zone: args.reverse_zone.clone(),
    }
}

fn build_pipeline(config: &Config) -> Pipeline {
    let checker = Arc::new(NamedCheckzone::new(
        config.checker.program.clone(),
        config.checker.timeout(),
    ));
    let service = Arc::new(CommandServiceController::new(
        config.service.reload_command.clone(),
        config.service.timeout(),
    ));
    Pipeline::new(config, checker, service)
}

async fn run(command: &Command, config: &Config, report: &mut Report) -> Result<i32> {
    match command {
        Command::Generate(args) => {
            let summary = build_pipeline(config)
                .generate(&zone_request(&args.zone), report)
                .await?;
            if args.print {
                print!("{}", summary.forward_text);
                println!();
                print!("{}", summary.reverse_text);
            }
            Ok(exit_code::SUCCESS)
        }

        Command::Deploy(args) => {
            let result = build_pipeline(config)
                .deploy(&zone_request(&args.zone), args.dry_run, report)
                .await?;
            if !result.outcome.dry_run && !result.outcome.reload_ok {
                warn!("Zones deployed but the name server was not reloaded");
            }
            Ok(exit_code::SUCCESS)
        }

        Command::Backup(args) => {
            let manager = BackupManager::new(&config.backup_root);
            let targets = backup_targets(config, args.category);
            run_backup(&manager, &targets, args.dry_run, report)?;
            Ok(exit_code::SUCCESS)
        }

        Command::Monitor(args) => {
            let summary = monitor(args, config, report).await?;
            print_monitor_results(&summary);
            if summary.has_failures() {
                Ok(exit_code::MONITOR_FAILURES)
            } else {
                Ok(exit_code::SUCCESS)
            }
        }

        Command::Completions(_) => Ok(exit_code::SUCCESS),
    }
}

async fn monitor(args: &MonitorArgs, config: &Config, report: &mut Report) -> Result<MonitorSummary> {
    let mut settings = config.monitor.clone();
    if let Some(server) = args.server {
        settings.server = server;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(ms) = args.latency_threshold_ms {
        settings.latency_threshold_ms = ms;
    }
    if let Some(secs) = args.query_timeout_secs {
        settings.query_timeout_secs = secs;
    }

    let (path, origin) = match (&args.zone_file, &args.forward_zone) {
        (Some(path), _) => (path.clone(), None),
        (None, Some(zone)) => {
            let origin = normalize_origin(zone)?;
            (live_zone_path(&config.zones_dir, &origin), Some(origin))
        }
        (None, None) => anyhow::bail!("monitor needs --zone-file or --forward-zone"),
    };

    let (origin, text) = load_deployed_zone(&path, origin.as_deref())?;

    let resolver = HickoryResolver::new(settings.server_addr(), settings.query_timeout());
    Ok(run_monitor(&resolver, &text, &origin, settings.latency_threshold(), report).await)
}

fn print_monitor_results(summary: &MonitorSummary) {
    for result in &summary.results {
        let latency = result
            .latency_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
        println!(
            "{:<5} {} {} forward={} reverse={} latency={} ({latency})",
            result.status.as_str().to_uppercase(),
            result.host,
            result.expected_ip,
            result.forward,
            result.reverse,
            result.latency,
        );
    }
}

/// Write the run summary and metrics. Failures here never change the exit code.
fn finish(global: &GlobalOpts, config: &Config, report: &Report, code: i32, started: Instant) {
    match report.write_summary(&config.report_dir) {
        Ok(path) => debug!(path = %path.display(), "Run summary written"),
        Err(e) => warn!(
            dir = %config.report_dir.display(),
            error = %e,
            "Failed to write run summary"
        ),
    }

    metrics::record_run(report.operation(), code == exit_code::SUCCESS, started.elapsed());
    if let Some(path) = &global.metrics_file {
        if let Err(e) = metrics::write_textfile(path) {
            warn!(path = %path.display(), error = %format!("{e:#}"), "Failed to write metrics");
        }
    }

    info!(operation = %report.operation(), exit_code = code, "zonekeeper finished");
}
