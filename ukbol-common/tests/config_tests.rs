//! Integration tests for configuration loading
//!
//! Uses serial_test to prevent environment variable races: tests touching
//! UKBOL_CONFIG or UKBOL_DATABASE are marked #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use ukbol_common::config::{
    load_config, resolve_database_path, ExtraRootPolicy, TomlConfig, CONFIG_ENV_VAR,
    DATABASE_ENV_VAR,
};
use ukbol_common::Error;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    let from_cli = config_file("[bins]\ngeography = \"fr\"\n");
    let from_env = config_file("[bins]\ngeography = \"de\"\n");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = load_config(Some(from_cli.path())).unwrap();
    assert_eq!(config.bins.geography, "fr");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    let file = config_file(
        r#"
        database_path = "/tmp/ukbol-from-env.db"

        [taxonomy]
        extra_roots = "retain"
        "#,
    );
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = load_config(None).unwrap();
    assert_eq!(config.taxonomy.extra_roots, ExtraRootPolicy::Retain);
    assert_eq!(config.database_path, Some(PathBuf::from("/tmp/ukbol-from-env.db")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let result = load_config(Some(Path::new("/nonexistent/ukbol/config.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_database_path_priority() {
    env::remove_var(DATABASE_ENV_VAR);
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/tmp/from-config.db")),
        ..Default::default()
    };

    assert_eq!(
        resolve_database_path(Some(Path::new("/tmp/from-cli.db")), &config),
        PathBuf::from("/tmp/from-cli.db")
    );

    env::set_var(DATABASE_ENV_VAR, "/tmp/from-env.db");
    assert_eq!(
        resolve_database_path(None, &config),
        PathBuf::from("/tmp/from-env.db")
    );
    env::remove_var(DATABASE_ENV_VAR);

    assert_eq!(
        resolve_database_path(None, &config),
        PathBuf::from("/tmp/from-config.db")
    );

    let fallback = resolve_database_path(None, &TomlConfig::default());
    assert!(fallback.ends_with("ukbol.db"));
}

#[test]
fn test_unknown_policy_rejected() {
    let result = TomlConfig::from_toml_str("[taxonomy]\nextra_roots = \"sometimes\"\n");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}
