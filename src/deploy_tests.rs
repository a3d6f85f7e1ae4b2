// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the atomic deployer.

#[cfg(test)]
mod tests {
    use crate::backup::BackupManager;
    use crate::deploy::Deployer;
    use crate::errors::PipelineError;
    use crate::report::{Report, Severity};
    use crate::testing::FakeService;
    use crate::zone::{live_zone_path, stage_zone, StagedZone};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const FORWARD: &str = "devops.lab";
    const REVERSE: &str = "1.168.192.in-addr.arpa";

    struct Fixture {
        work: TempDir,
        service: Arc<FakeService>,
        deployer: Deployer,
    }

    impl Fixture {
        fn new(service: FakeService) -> Self {
            let work = TempDir::new().unwrap();
            let service = Arc::new(service);
            let deployer = Deployer::new(
                BackupManager::new(work.path().join("backups")),
                service.clone(),
                0o644,
                30,
            );
            Self {
                work,
                service,
                deployer,
            }
        }

        fn zones_dir(&self) -> std::path::PathBuf {
            self.work.path().join("zones")
        }

        fn live(&self, origin: &str) -> std::path::PathBuf {
            live_zone_path(&self.zones_dir(), origin)
        }

        fn stage(&self, origin: &str, text: &str) -> StagedZone {
            stage_zone(origin, text.to_string(), &self.live(origin)).unwrap()
        }

        fn write_live(&self, origin: &str, text: &str) {
            fs::create_dir_all(self.zones_dir()).unwrap();
            fs::write(self.live(origin), text).unwrap();
        }
    }

    fn staged_leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".staged"))
            .collect()
    }

    #[tokio::test]
    async fn test_deploy_replaces_backs_up_and_reloads() {
        let fx = Fixture::new(FakeService::healthy());
        fx.write_live(FORWARD, "old forward\n");
        fx.write_live(REVERSE, "old reverse\n");

        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");

        let outcome = fx
            .deployer
            .deploy(forward, reverse, false, &mut report)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(fx.live(FORWARD)).unwrap(), "new forward\n");
        assert_eq!(fs::read_to_string(fx.live(REVERSE)).unwrap(), "new reverse\n");
        assert_eq!(outcome.deployed, vec![fx.live(REVERSE), fx.live(FORWARD)]);
        assert!(outcome.reload_ok);
        assert_eq!(fx.service.reloads(), 1);

        let archive = outcome.backup.expect("live files must be backed up");
        assert!(archive.verified_readable);
        assert_eq!(archive.source_paths.len(), 2);
        assert!(staged_leftovers(&fx.zones_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_deploy_prunes_expired_zone_archives() {
        let fx = Fixture::new(FakeService::healthy());
        let zones_backups = fx.work.path().join("backups").join("zones");
        fs::create_dir_all(&zones_backups).unwrap();
        let expired = zones_backups.join("zones-20250101-000000.tar.gz");
        fs::write(&expired, "old archive").unwrap();
        fs::write(zones_backups.join("zones-20250101-000000.tar.gz.sha256"), "x").unwrap();
        fx.write_live(FORWARD, "old forward\n");

        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");
        let outcome = fx
            .deployer
            .deploy(forward, reverse, false, &mut report)
            .await
            .unwrap();

        let archive = outcome.backup.unwrap();
        assert!(archive.path.exists());
        assert!(!expired.exists());
        assert!(!zones_backups
            .join("zones-20250101-000000.tar.gz.sha256")
            .exists());
        assert!(report
            .entries()
            .iter()
            .any(|e| e.message.starts_with("Retention removed 1 zones archive(s)")));
    }

    #[tokio::test]
    async fn test_first_deploy_has_nothing_to_back_up() {
        let fx = Fixture::new(FakeService::healthy());
        let forward = fx.stage(FORWARD, "forward\n");
        let reverse = fx.stage(REVERSE, "reverse\n");
        let mut report = Report::new("deploy");

        let outcome = fx
            .deployer
            .deploy(forward, reverse, false, &mut report)
            .await
            .unwrap();

        assert!(outcome.backup.is_none());
        assert_eq!(outcome.deployed.len(), 2);
        assert!(fx.live(FORWARD).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deployed_files_get_configured_mode() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new(FakeService::healthy());
        let forward = fx.stage(FORWARD, "forward\n");
        let reverse = fx.stage(REVERSE, "reverse\n");
        let mut report = Report::new("deploy");
        fx.deployer
            .deploy(forward, reverse, false, &mut report)
            .await
            .unwrap();

        let mode = fs::metadata(fx.live(FORWARD)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[tokio::test]
    async fn test_reload_failure_is_a_warning() {
        let fx = Fixture::new(FakeService::failing());
        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");

        let outcome = fx
            .deployer
            .deploy(forward, reverse, false, &mut report)
            .await
            .unwrap();

        assert!(!outcome.reload_ok);
        assert_eq!(report.count(Severity::Warn), 1);
        assert_eq!(fs::read_to_string(fx.live(FORWARD)).unwrap(), "new forward\n");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let fx = Fixture::new(FakeService::healthy());
        fx.write_live(FORWARD, "old forward\n");

        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");

        let outcome = fx
            .deployer
            .deploy(forward, reverse, true, &mut report)
            .await
            .unwrap();

        assert!(outcome.dry_run);
        assert!(outcome.deployed.is_empty());
        assert_eq!(fx.service.reloads(), 0);
        assert_eq!(fs::read_to_string(fx.live(FORWARD)).unwrap(), "old forward\n");
        assert!(!fx.live(REVERSE).exists());
        assert!(!fx.work.path().join("backups").exists());
        assert!(staged_leftovers(&fx.zones_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_backup_blocks_deploy() {
        let fx = Fixture::new(FakeService::healthy());
        fx.write_live(FORWARD, "old forward\n");
        // a file where the backup root should be makes archive creation fail
        fs::write(fx.work.path().join("backups"), "not a directory").unwrap();

        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");

        let result = fx.deployer.deploy(forward, reverse, false, &mut report).await;

        assert!(matches!(result, Err(PipelineError::Backup(_))));
        assert_eq!(fs::read_to_string(fx.live(FORWARD)).unwrap(), "old forward\n");
        assert!(!fx.live(REVERSE).exists());
        assert_eq!(fx.service.reloads(), 0);
        assert!(report.count(Severity::Error) >= 1);
    }

    #[test]
    fn test_crash_before_rename_leaves_live_zone_unchanged() {
        let fx = Fixture::new(FakeService::healthy());
        fx.write_live(FORWARD, "old forward\n");
        let original = fs::read(fx.live(FORWARD)).unwrap();

        let forward = fx.stage(FORWARD, "new forward\n");
        let mut report = Report::new("deploy");
        fx.deployer.backup_live(&[&forward], &mut report).unwrap();

        // process dies here: the staged file is dropped without promotion
        drop(forward);

        assert_eq!(fs::read(fx.live(FORWARD)).unwrap(), original);
        assert!(staged_leftovers(&fx.zones_dir()).is_empty());
    }

    #[test]
    fn test_crash_after_rename_leaves_new_zone_in_place() {
        let fx = Fixture::new(FakeService::healthy());
        fx.write_live(FORWARD, "old forward\n");
        fx.write_live(REVERSE, "old reverse\n");

        let forward = fx.stage(FORWARD, "new forward\n");
        let reverse = fx.stage(REVERSE, "new reverse\n");
        let mut report = Report::new("deploy");
        fx.deployer
            .backup_live(&[&forward, &reverse], &mut report)
            .unwrap();
        fx.deployer.promote(reverse, &mut report).unwrap();
        fx.deployer.promote(forward, &mut report).unwrap();

        // process dies before reload
        assert_eq!(fs::read_to_string(fx.live(FORWARD)).unwrap(), "new forward\n");
        assert_eq!(fs::read_to_string(fx.live(REVERSE)).unwrap(), "new reverse\n");
        assert!(staged_leftovers(&fx.zones_dir()).is_empty());
        assert_eq!(fx.service.reloads(), 0);
    }
}
