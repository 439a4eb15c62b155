//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use stockwatch_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use tempfile::NamedTempFile;

const VARS: &[&str] = &[
    "STOCKWATCH_DATA_DIR",
    "STOCKWATCH_RETENTION_DAYS",
    "STOCKWATCH_CONFIDENCE_THRESHOLD",
    "STOCKWATCH_POLL_INTERVAL_MS",
    "STOCKWATCH_REMOTE_URL",
    "STOCKWATCH_INGEST_TOKEN",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(
        r#"
retention_days = 1
# everything else stays at its default
"#,
    );

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.retention_days.value, 1);
    assert_eq!(config.retention_days.source, ConfigSource::File);
    assert_eq!(config.poll_interval_ms.value, 500);
    assert_eq!(config.poll_interval_ms.source, ConfigSource::Default);
}

#[test]
fn test_unreadable_file_is_an_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/stockwatch.toml");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("STOCKWATCH_DATA_DIR", "/env/data");
    env::set_var("STOCKWATCH_RETENTION_DAYS", "9");

    let file = config_file(
        r#"
data_dir = "/file/data"
retention_days = 2
poll_interval_ms = 250
"#,
    );

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.data_dir.value, PathBuf::from("/env/data"));
    assert_eq!(config.data_dir.source, ConfigSource::Environment);
    assert_eq!(config.retention_days.value, 9);
    assert_eq!(config.poll_interval_ms.value, 250);
    assert_eq!(config.poll_interval_ms.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("STOCKWATCH_CONFIDENCE_THRESHOLD", "very sure");
    env::set_var("STOCKWATCH_POLL_INTERVAL_MS", "0");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.confidence_threshold.value, 0.5);
    assert_eq!(config.confidence_threshold.source, ConfigSource::Default);
    assert_eq!(config.poll_interval_ms.value, 500);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_remote_target_needs_url_and_token() {
    clear_env();
    env::set_var("STOCKWATCH_REMOTE_URL", "https://dashboard.example");

    let config = LayeredConfig::with_defaults().load_from_env();
    assert!(config.remote_target().is_none());

    env::set_var("STOCKWATCH_INGEST_TOKEN", "t0ken");
    let config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(
        config.remote_target(),
        Some(("https://dashboard.example".to_string(), "t0ken".to_string()))
    );

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("STOCKWATCH_DATA_DIR", "/env/data");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    config.update_from_cli(CliConfigOverrides {
        data_dir: Some(PathBuf::from("/cli/data")),
        ..Default::default()
    });

    assert_eq!(config.data_dir.value, PathBuf::from("/cli/data"));
    assert_eq!(config.data_dir.source, ConfigSource::Cli);

    clear_env();
}
