// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for configuration loading and validation.

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.zones_dir, PathBuf::from("/etc/bind/zones"));
        assert_eq!(config.zone_file_mode, 0o644);
        assert_eq!(config.retention.zones_days, 30);
        assert_eq!(config.retention.config_days, 7);
        assert_eq!(config.checker.program, "named-checkzone");
        assert_eq!(
            config.service.reload_command,
            vec!["systemctl", "reload", "bind9"]
        );
        assert_eq!(config.monitor.port, 53);
        assert_eq!(config.monitor.latency_threshold(), Duration::from_millis(100));
        assert_eq!(config.monitor.query_timeout(), Duration::from_secs(3));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            "zones_dir: /srv/zones\n\
             zone_file_mode: 0o640\n\
             soa:\n  primary_ns: ns1\n  admin_contact: admin@devops.lab\n  name_server_ip: 192.168.1.2\n\
             service:\n  reload_command: [rndc, reload]\n\
             monitor:\n  server: 192.168.1.2\n  port: 5353\n",
        )
        .unwrap();

        assert_eq!(config.zones_dir, PathBuf::from("/srv/zones"));
        assert_eq!(config.zone_file_mode, 0o640);
        assert_eq!(config.soa.admin_contact, "admin@devops.lab");
        assert_eq!(config.soa.name_server_ip, Some(Ipv4Addr::new(192, 168, 1, 2)));
        assert_eq!(config.soa.ttl, 86400);
        assert_eq!(config.service.reload_command, vec!["rndc", "reload"]);
        assert_eq!(
            config.monitor.server_addr(),
            "192.168.1.2:5353".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.retention.zones_days, 30);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_yaml("zone_dir: /srv/zones\n").is_err());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.checker.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retention.zones_days = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("retention.zones_days"));

        let mut config = Config::default();
        config.service.reload_command.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "backup_root: /srv/backups\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backup_root, PathBuf::from("/srv/backups"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "retention: [not, a, map]\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
