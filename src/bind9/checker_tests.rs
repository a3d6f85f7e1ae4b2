// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the zone validation gate.

#[cfg(test)]
mod tests {
    use crate::bind9::checker::{validate_staged, NamedCheckzone, ZoneChecker};
    use crate::errors::ValidationError;
    use crate::report::{Report, Severity};
    use crate::testing::FakeChecker;
    use crate::zone::{live_zone_path, stage_zone, StagedZone};
    use std::time::Duration;
    use tempfile::TempDir;

    fn stage_pair(dir: &TempDir) -> (StagedZone, StagedZone) {
        let forward = stage_zone(
            "devops.lab",
            "forward zone\n".to_string(),
            &live_zone_path(dir.path(), "devops.lab"),
        )
        .unwrap();
        let reverse = stage_zone(
            "1.168.192.in-addr.arpa",
            "reverse zone\n".to_string(),
            &live_zone_path(dir.path(), "1.168.192.in-addr.arpa"),
        )
        .unwrap();
        (forward, reverse)
    }

    #[tokio::test]
    async fn test_both_zones_pass() {
        let dir = TempDir::new().unwrap();
        let (forward, reverse) = stage_pair(&dir);
        let checker = FakeChecker::passing();
        let mut report = Report::new("generate");

        validate_staged(&checker, &[&forward, &reverse], &mut report)
            .await
            .unwrap();

        assert_eq!(report.count(Severity::Pass), 2);
        let calls = checker.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "devops.lab");
        assert_eq!(calls[0].1, forward.path());
        assert_eq!(calls[0].2, "forward zone\n");
        assert_eq!(calls[1].0, "1.168.192.in-addr.arpa");
    }

    #[tokio::test]
    async fn test_rejection_checks_every_zone_then_fails() {
        let dir = TempDir::new().unwrap();
        let (forward, reverse) = stage_pair(&dir);
        let checker = FakeChecker::rejecting("devops.lab", "dns_master_load: bad owner name");
        let mut report = Report::new("generate");

        let result = validate_staged(&checker, &[&forward, &reverse], &mut report).await;

        match result {
            Err(ValidationError::Rejected { zone, output, .. }) => {
                assert_eq!(zone, "devops.lab");
                assert!(output.contains("bad owner name"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(checker.calls().len(), 2, "reverse zone must still be checked");
        assert_eq!(report.count(Severity::Fail), 1);
        assert_eq!(report.count(Severity::Pass), 1);
    }

    #[tokio::test]
    async fn test_unavailable_checker_fails_closed() {
        let dir = TempDir::new().unwrap();
        let (forward, reverse) = stage_pair(&dir);
        let checker = FakeChecker::unavailable();
        let mut report = Report::new("generate");

        let result = validate_staged(&checker, &[&forward, &reverse], &mut report).await;
        assert!(matches!(
            result,
            Err(ValidationError::CheckerUnavailable { .. })
        ));
        assert_eq!(report.count(Severity::Error), 2);
    }

    #[tokio::test]
    async fn test_validation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (forward, reverse) = stage_pair(&dir);
        let checker = FakeChecker::rejecting("1.168.192.in-addr.arpa", "bad PTR");
        let mut report = Report::new("generate");

        let first = validate_staged(&checker, &[&forward, &reverse], &mut report)
            .await
            .is_ok();
        let second = validate_staged(&checker, &[&forward, &reverse], &mut report)
            .await
            .is_ok();
        assert_eq!(first, second);
        assert!(!first);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_named_checkzone_maps_exit_status() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.devops.lab");
        std::fs::write(&path, "zone\n").unwrap();

        let ok = NamedCheckzone::new("true", Duration::from_secs(5))
            .check_zone("devops.lab", &path)
            .await
            .unwrap();
        assert!(ok.passed);

        let rejected = NamedCheckzone::new("false", Duration::from_secs(5))
            .check_zone("devops.lab", &path)
            .await
            .unwrap();
        assert!(!rejected.passed);
    }

    #[tokio::test]
    #[ignore = "Requires named-checkzone from the bind9utils package"]
    async fn test_real_named_checkzone_accepts_rendered_zone() {
        use crate::inventory::parse_inventory_str;
        use crate::zone::{render_forward, SoaData, ZoneDocument};

        let dir = TempDir::new().unwrap();
        let doc = ZoneDocument {
            origin: "devops.lab".to_string(),
            reverse_origin: "1.168.192.in-addr.arpa".to_string(),
            soa: SoaData {
                serial: 2_026_101_801,
                ttl: 86400,
                primary_ns: "ns1.devops.lab.".to_string(),
                admin_contact: "admin.devops.lab.".to_string(),
            },
            name_server_ip: Some("192.168.1.2".parse().unwrap()),
            records: parse_inventory_str("hostname,ip,type,alias\nweb,192.168.1.10,A,www\n")
                .unwrap(),
        };
        let path = dir.path().join("db.devops.lab");
        std::fs::write(&path, render_forward(&doc)).unwrap();

        let result = NamedCheckzone::new("named-checkzone", Duration::from_secs(10))
            .check_zone("devops.lab", &path)
            .await
            .unwrap();
        assert!(result.passed, "{}", result.output);
    }
}
