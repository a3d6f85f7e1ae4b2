// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end tests of the zone lifecycle: deploy, redeploy, back up and
//! monitor, all inside a temporary directory.
//!
//! Run with: cargo test --test pipeline_integration

mod common;

use std::fs;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use common::{temp_config, CountingService, SoaChecker, TableResolver};
use zonekeeper::backup::BackupManager;
use zonekeeper::monitor::{load_deployed_zone, run_monitor, CheckStatus};
use zonekeeper::pipeline::{backup_targets, run_backup, BackupScope, Pipeline, ZoneRequest};
use zonekeeper::report::{Report, Severity};
use zonekeeper::zone::{extract_a_records, extract_serial, live_zone_path};

const INVENTORY: &str = "\
hostname,ip,type,alias
web,192.168.1.10,A,www
db,192.168.1.20,A,
";

fn request(work: &TempDir) -> ZoneRequest {
    let inventory = work.path().join("hosts.csv");
    fs::write(&inventory, INVENTORY).unwrap();
    ZoneRequest {
        inventory,
        forward_zone: "devops.lab".to_string(),
        reverse_zone: "1.168.192.in-addr.arpa".to_string(),
    }
}

#[tokio::test]
async fn test_deploy_lifecycle() {
    let work = TempDir::new().unwrap();
    let config = temp_config(&work);
    let checker = Arc::new(SoaChecker::default());
    let service = Arc::new(CountingService::default());
    let pipeline = Pipeline::new(&config, checker.clone(), service.clone()).with_today("20261018");
    let request = request(&work);

    let mut report = Report::with_log_file("deploy", &config.log_file);
    let first = pipeline.deploy(&request, false, &mut report).await.unwrap();
    assert_eq!(first.summary.serial, 2_026_101_801);

    let mut report = Report::with_log_file("deploy", &config.log_file);
    let second = pipeline.deploy(&request, false, &mut report).await.unwrap();
    assert_eq!(second.summary.serial, 2_026_101_802);
    assert_eq!(service.reloads(), 2);
    assert_eq!(checker.checked.lock().unwrap().len(), 4);

    let forward_path = live_zone_path(&config.zones_dir, "devops.lab");
    let forward = fs::read_to_string(&forward_path).unwrap();
    assert_eq!(extract_serial(&forward).as_deref(), Some("2026101802"));
    assert!(forward.contains("@\tIN\tSOA\tns1.devops.lab. admin.devops.lab. ("));
    assert!(forward.contains("ns1\tIN\tA\t192.168.1.2"));
    assert!(forward.contains("www\tIN\tCNAME\tweb"));

    // the glue record plus one A per inventory row
    let hosts = extract_a_records(&forward);
    assert_eq!(hosts.len(), 3);

    let archive = second.outcome.backup.expect("second deploy backs up the first");
    assert!(archive.verified_readable);
    assert!(archive.path.starts_with(config.backup_root.join("zones")));

    // the append-only log saw both runs
    let log = fs::read_to_string(&config.log_file).unwrap();
    assert!(log.contains("[INFO] Serial none -> 2026101801"));
    assert!(log.contains("[INFO] Serial 2026101801 -> 2026101802"));
    assert!(log.contains("[PASS] Zone devops.lab passed validation"));

    let summary_path = report.write_summary(&config.report_dir).unwrap();
    assert!(summary_path.exists());
}

#[tokio::test]
async fn test_monitor_deployed_zone() {
    let work = TempDir::new().unwrap();
    let config = temp_config(&work);
    let pipeline = Pipeline::new(
        &config,
        Arc::new(SoaChecker::default()),
        Arc::new(CountingService::default()),
    );
    let mut report = Report::new("deploy");
    pipeline.deploy(&request(&work), false, &mut report).await.unwrap();

    let web = Ipv4Addr::new(192, 168, 1, 10);
    let db = Ipv4Addr::new(192, 168, 1, 20);
    let ns1 = Ipv4Addr::new(192, 168, 1, 2);
    let mut resolver = TableResolver::default();
    resolver.forward.insert("web.devops.lab.".to_string(), vec![web]);
    resolver.forward.insert("ns1.devops.lab.".to_string(), vec![ns1]);
    resolver
        .forward
        .insert("db.devops.lab.".to_string(), vec![Ipv4Addr::new(192, 168, 1, 21)]);
    resolver.reverse.insert(web, vec!["web.devops.lab.".to_string()]);
    resolver.reverse.insert(ns1, vec!["ns1.devops.lab.".to_string()]);
    resolver.reverse.insert(db, vec!["db.devops.lab.".to_string()]);

    let path = live_zone_path(&config.zones_dir, "devops.lab");
    let (origin, text) = load_deployed_zone(&path, None).unwrap();
    assert_eq!(origin, "devops.lab");

    let mut report = Report::new("monitor");
    let summary = run_monitor(&resolver, &text, &origin, Duration::from_secs(1), &mut report).await;

    assert_eq!(summary.results.len(), 3);
    let db_result = summary
        .results
        .iter()
        .find(|r| r.host == "db.devops.lab.")
        .unwrap();
    assert_eq!(db_result.forward, CheckStatus::Fail);
    assert_eq!(db_result.reverse, CheckStatus::Pass);
    assert!(summary.has_failures());
    assert_eq!(summary.count(CheckStatus::Pass), 2);
    assert!(report.count(Severity::Fail) >= 1);
}

/// Resolver answering with exactly the records of the deployed zone files.
fn resolver_from_deployed(forward: &str, reverse: &str, origin: &str) -> TableResolver {
    let mut resolver = TableResolver::default();
    for host in extract_a_records(forward) {
        resolver
            .forward
            .insert(format!("{}.{origin}.", host.hostname), vec![host.expected_ip]);
    }
    for line in reverse.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if let [octet, "IN", "PTR", target] = fields.as_slice() {
            let ip = Ipv4Addr::new(192, 168, 1, octet.parse().unwrap());
            resolver.reverse.insert(ip, vec![(*target).to_string()]);
        }
    }
    resolver
}

#[tokio::test]
async fn test_zone_with_glue_monitors_clean() {
    let work = TempDir::new().unwrap();
    let config = temp_config(&work);
    assert!(config.soa.name_server_ip.is_some());
    let pipeline = Pipeline::new(
        &config,
        Arc::new(SoaChecker::default()),
        Arc::new(CountingService::default()),
    );
    let mut report = Report::new("deploy");
    pipeline.deploy(&request(&work), false, &mut report).await.unwrap();

    let forward_path = live_zone_path(&config.zones_dir, "devops.lab");
    let reverse_path = live_zone_path(&config.zones_dir, "1.168.192.in-addr.arpa");
    let reverse = fs::read_to_string(&reverse_path).unwrap();
    assert!(reverse.contains("2\tIN\tPTR\tns1.devops.lab."));

    let (origin, forward) = load_deployed_zone(&forward_path, None).unwrap();
    let resolver = resolver_from_deployed(&forward, &reverse, &origin);

    let mut report = Report::new("monitor");
    let summary = run_monitor(&resolver, &forward, &origin, Duration::from_secs(1), &mut report).await;

    assert_eq!(summary.results.len(), 3);
    assert!(!summary.has_failures(), "{:?}", summary.results);
    assert_eq!(summary.count(CheckStatus::Pass), 3);
}

#[test]
fn test_scheduled_backup_of_all_categories() {
    let work = TempDir::new().unwrap();
    let config = temp_config(&work);
    fs::create_dir_all(&config.zones_dir).unwrap();
    fs::write(config.zones_dir.join("db.devops.lab"), "zone\n").unwrap();
    fs::create_dir_all(config.bind_config_dir.join("keys")).unwrap();
    fs::write(config.bind_config_dir.join("named.conf"), "options {};\n").unwrap();
    fs::write(config.bind_config_dir.join("keys").join("rndc.key"), "key\n").unwrap();

    let manager = BackupManager::new(&config.backup_root);
    let mut report = Report::new("backup");
    let archives = run_backup(
        &manager,
        &backup_targets(&config, BackupScope::All),
        false,
        &mut report,
    )
    .unwrap();

    assert_eq!(archives.len(), 2);
    let config_archive = &archives[1];
    assert!(config_archive.entries >= 3);
    assert!(fs::metadata(format!("{}.sha256", config_archive.path.display())).is_ok());
    assert_eq!(report.count(Severity::Error), 0);
}
