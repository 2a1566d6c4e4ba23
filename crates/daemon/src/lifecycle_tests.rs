// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sked_core::{ClusteringType, ConfigError, OutagePolicy};
use std::io::Write;

const FULL: &str = r#"
[worker]
cluster = "payments"
worker = "node-a"
supervise = false
worker_signal_rate = "15s"
job_sync_rate = "1m"
parallelism = 4
outage_policy = "suspend_removals"

[worker.registration]
attempts = 12
delay = "2s"

[worker.clustering]
clustering_type = "JDBC"
data_source = "quartzDS"
data_source_uri = "jdbc:postgresql://db/sked"

[controller]
url = "http://controller:8080/api"
timeout = "3s"

[logging]
filter = "sked=debug"
file = "/var/log/skedd.log"

[shell]
workdir = "/srv/jobs"
"#;

#[test]
fn parses_every_section() {
    let config = DaemonConfig::parse(FULL).unwrap();

    assert_eq!(config.worker.cluster, "payments");
    assert_eq!(config.worker.worker, "node-a");
    assert!(!config.worker.supervise);
    assert_eq!(config.worker.worker_signal_rate, Duration::from_secs(15));
    assert_eq!(config.worker.job_sync_rate, Duration::from_secs(60));
    assert_eq!(config.worker.parallelism, 4);
    assert_eq!(config.worker.outage_policy, OutagePolicy::SuspendRemovals);
    assert_eq!(config.worker.registration.attempts, 12);
    assert_eq!(config.worker.registration.delay, Duration::from_secs(2));
    assert_eq!(
        config.worker.clustering.clustering_type,
        ClusteringType::Jdbc
    );
    assert_eq!(config.controller.url, "http://controller:8080/api");
    assert_eq!(config.controller.timeout, Duration::from_secs(3));
    assert_eq!(config.logging.filter, "sked=debug");
    assert_eq!(
        config.logging.file,
        Some(PathBuf::from("/var/log/skedd.log"))
    );
    assert_eq!(config.shell.workdir, Some(PathBuf::from("/srv/jobs")));
}

#[test]
fn minimal_config_uses_defaults() {
    let config = DaemonConfig::parse("[controller]\nurl = \"http://localhost:9000\"\n").unwrap();

    assert_eq!(config.worker, WorkerConfig::default());
    assert_eq!(config.controller.timeout, Duration::from_secs(10));
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.shell.workdir, None);
}

#[test]
fn controller_url_is_required() {
    let error = DaemonConfig::parse("[worker]\ncluster = \"c1\"\n").unwrap_err();
    assert!(matches!(error, LifecycleError::MissingControllerUrl));
}

#[test]
fn zero_timeout_is_rejected() {
    let error =
        DaemonConfig::parse("[controller]\nurl = \"http://x\"\ntimeout = \"0s\"\n").unwrap_err();
    assert!(matches!(error, LifecycleError::ZeroTimeout));
}

#[test]
fn invalid_worker_config_is_rejected() {
    let text = "[controller]\nurl = \"http://x\"\n[worker]\nparallelism = 0\n";
    let error = DaemonConfig::parse(text).unwrap_err();
    assert!(matches!(
        error,
        LifecycleError::Worker(WorkerError::Config(ConfigError::Zero("parallelism")))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let error = DaemonConfig::parse("[controller\nurl = ").unwrap_err();
    assert!(matches!(error, LifecycleError::ParseConfig(_)));
    assert!(error.to_string().starts_with("invalid config"));
}

#[test]
fn unknown_duration_is_a_parse_error() {
    let text = "[controller]\nurl = \"http://x\"\ntimeout = \"soon\"\n";
    assert!(matches!(
        DaemonConfig::parse(text),
        Err(LifecycleError::ParseConfig(_))
    ));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL.as_bytes()).unwrap();

    let config = DaemonConfig::load(file.path()).unwrap();

    assert_eq!(config.worker.cluster, "payments");
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let error = DaemonConfig::load(&path).unwrap_err();

    assert!(matches!(&error, LifecycleError::ReadConfig(p, _) if p == &path));
    assert!(error.to_string().contains("absent.toml"));
}

#[test]
fn registry_offers_shell_jobs() {
    let registry = registry(&DaemonConfig::default());
    assert!(registry.supports("SHELL"));
    assert_eq!(registry.types(), vec!["shell"]);
}

#[tokio::test]
async fn unreachable_controller_fails_startup() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let mut config = DaemonConfig::default();
    config.controller.url = url;
    config.controller.timeout = Duration::from_secs(2);
    config.worker.registration.attempts = 2;
    config.worker.registration.delay = Duration::from_millis(10);

    let error = startup(&config).await.err().unwrap();

    assert!(matches!(
        error,
        LifecycleError::Worker(WorkerError::RegistrationExhausted { attempts: 2 })
    ));
}

#[tokio::test]
async fn abandoned_registration_shuts_down_cleanly() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    let mut config = DaemonConfig::default();
    config.controller.url = url;
    config.controller.timeout = Duration::from_secs(2);
    config.worker.registration.attempts = 100;
    config.worker.registration.delay = Duration::from_secs(5);

    let mut worker = build(&config);
    let pending = tokio::time::timeout(Duration::from_millis(500), start(&mut worker)).await;
    assert!(pending.is_err());
    assert_eq!(worker.state(), sked_engine::WorkerState::Registering);
    assert!(worker.agent().is_none());

    worker.shutdown().await;
    assert_eq!(worker.state(), sked_engine::WorkerState::Stopped);
}
