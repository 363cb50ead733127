//! Configuration loading against files on disk.

use std::fs;
use std::path::PathBuf;

use requiam_cli::commands::show_overrides::{self, ShowOverridesArgs};
use requiam_cli::commands::sync::plan_targets;
use requiam_cli::{AppConfig, CliError};
use requiam_sync::{ManualOverride, OverrideCategory};
use tempfile::TempDir;

fn repo_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

#[test]
fn test_example_config_parses_and_validates() {
    let config = AppConfig::from_file(repo_config_dir().join("requiam.example.yaml")).unwrap();
    config.validate().unwrap();

    assert!(!config.grouper.production);
    assert_eq!(
        config.sync.on_transport_error,
        requiam_sync::TransportErrorPolicy::Abort
    );
    assert_eq!(config.portals["sci_math"], vec!["0404", "0413"]);
    assert_eq!(plan_targets(&config, false, false).len(), 5);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("requiam.yaml");
    fs::write(&path, "ldap: [not, a, map]\n").unwrap();
    assert!(matches!(
        AppConfig::from_file(&path).unwrap_err(),
        CliError::Config(_)
    ));
}

#[test]
fn test_bundled_templates_load_as_empty_tables() {
    let dir = TempDir::new().unwrap();
    for name in ["portal_manual_template.csv", "quota_manual_template.csv"] {
        fs::copy(repo_config_dir().join(name), dir.path().join(name)).unwrap();
    }

    let mut config = AppConfig::from_file(repo_config_dir().join("requiam.example.yaml")).unwrap();
    config.overrides.dir = dir.path().to_path_buf();

    let overrides = ManualOverride::load(&config.overrides.files(), false).unwrap();
    assert!(overrides.table(OverrideCategory::Portal).is_empty());
    assert!(overrides.table(OverrideCategory::Quota).is_empty());

    show_overrides::execute(
        ShowOverridesArgs {
            portal: false,
            quota: false,
        },
        &config,
    )
    .unwrap();
}

#[test]
fn test_show_overrides_without_store_fails() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::from_file(repo_config_dir().join("requiam.example.yaml")).unwrap();
    config.overrides.dir = dir.path().to_path_buf();

    let err = show_overrides::execute(
        ShowOverridesArgs {
            portal: true,
            quota: false,
        },
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, CliError::Io(_)));
}
