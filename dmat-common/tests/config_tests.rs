//! Tests for bootstrap configuration loading and path resolution
//!
//! Tests that touch DMAT_* environment variables are marked #[serial] so
//! they never run in parallel with each other.

use dmat_common::config::{
    resolve_config_path, resolve_database_path, TomlConfig, ENV_CONFIG, ENV_DATABASE, ENV_PORT,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_defaults_when_fields_missing() {
    let config = TomlConfig::from_toml_str("").unwrap();

    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.port, 8000);
    assert!(config.auto_import);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.workbooks.checksheet, PathBuf::from("data/CheckSheetData.xlsx"));
    assert_eq!(config.workbooks.maturity, PathBuf::from("data/MM_Data.xlsx"));
    assert!(config.database_path.is_none());
    assert!(config.layouts.is_none());
}

#[test]
fn test_full_config_parses() {
    let config = TomlConfig::from_toml_str(
        r#"
        database_path = "/var/lib/dmat/dmat.db"
        port = 9100
        auto_import = false

        [workbooks]
        checksheet = "/srv/CheckSheet.xlsx"

        [logging]
        level = "debug"

        [layouts.checksheet]
        sheet = "Criteria"
        "#,
    )
    .unwrap();

    assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/dmat/dmat.db")));
    assert_eq!(config.port, 9100);
    assert!(!config.auto_import);
    assert_eq!(config.workbooks.checksheet, PathBuf::from("/srv/CheckSheet.xlsx"));
    assert_eq!(config.workbooks.maturity, PathBuf::from("data/MM_Data.xlsx"));
    assert_eq!(config.logging.level, "debug");
    assert!(config.layouts.is_some());
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = TomlConfig::from_toml_str("port = \"not a number\"").unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_missing_explicit_file_is_error() {
    let err = TomlConfig::from_file(Path::new("/nonexistent/dmat.toml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/dmat.toml"));
}

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    env::set_var(ENV_CONFIG, "/tmp/from-env.toml");
    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")));
    env::remove_var(ENV_CONFIG);

    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));
}

#[test]
#[serial]
fn test_environment_config_path() {
    env::set_var(ENV_CONFIG, "/tmp/from-env.toml");
    let resolved = resolve_config_path(None);
    env::remove_var(ENV_CONFIG);

    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));
}

#[test]
#[serial]
fn test_load_reads_file_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dmat.toml");
    std::fs::write(&path, "port = 7777\n").unwrap();

    env::set_var(ENV_CONFIG, &path);
    let config = TomlConfig::load(None);
    env::remove_var(ENV_CONFIG);

    assert_eq!(config.unwrap().port, 7777);
}

#[test]
#[serial]
fn test_database_path_priority() {
    let mut config = TomlConfig::default();
    config.database_path = Some(PathBuf::from("/from/toml.db"));

    env::remove_var(ENV_DATABASE);
    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/from/toml.db"));

    env::set_var(ENV_DATABASE, "/from/env.db");
    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/from/env.db"));
    assert_eq!(
        resolve_database_path(Some(Path::new("/from/cli.db")), &config),
        PathBuf::from("/from/cli.db")
    );
    env::remove_var(ENV_DATABASE);

    config.database_path = None;
    let fallback = resolve_database_path(None, &config);
    assert!(fallback.ends_with("dmat/dmat.db") || fallback.ends_with("dmat_data/dmat.db"));
}

#[test]
#[serial]
fn test_port_environment_override() {
    let config = TomlConfig::default();

    env::set_var(ENV_PORT, "9200");
    assert_eq!(config.effective_port(), 9200);

    env::set_var(ENV_PORT, "not-a-port");
    assert_eq!(config.effective_port(), 8000);

    env::remove_var(ENV_PORT);
    assert_eq!(config.effective_port(), 8000);
}
