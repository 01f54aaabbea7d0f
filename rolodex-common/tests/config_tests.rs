//! Configuration loading and root folder resolution
//!
//! Tests touching ROLODEX_ROOT_FOLDER are marked #[serial] so they never
//! race on the process environment.

use rolodex_common::config::{
    default_root_folder, resolve_root_folder, BirthdayOnCreate, OrphanPolicy, RolodexConfig,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_defaults() {
    let config = RolodexConfig::default();
    assert_eq!(config.database_file, "rolodex.db");
    assert_eq!(config.log_level, "info");
    assert_eq!(config.busy_timeout_ms, 5000);
    assert_eq!(config.commit_timeout_ms, 10_000);
    assert_eq!(config.orphan_policy, OrphanPolicy::Ignore);
    assert_eq!(config.birthday_on_create, BirthdayOnCreate::Always);
    assert_eq!(config.event_capacity, 100);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = RolodexConfig::from_toml_str(
        r#"
        orphan_policy = "insert"
        birthday_on_create = "when_present"
        commit_timeout_ms = 250
        "#,
    )
    .unwrap();

    assert_eq!(config.orphan_policy, OrphanPolicy::Insert);
    assert_eq!(config.birthday_on_create, BirthdayOnCreate::WhenPresent);
    assert_eq!(config.commit_timeout_ms, 250);
    assert_eq!(config.database_file, "rolodex.db");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = RolodexConfig::from_toml_str("orphan_policy = \"sometimes\"");
    assert!(matches!(result, Err(rolodex_common::Error::Config(_))));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = RolodexConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, RolodexConfig::default());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "root_folder = \"/srv/contacts\"\ndatabase_file = \"c.db\"\n").unwrap();

    let config = RolodexConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/contacts")));
    assert_eq!(
        config.database_path(Path::new("/srv/contacts")),
        PathBuf::from("/srv/contacts/c.db")
    );
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/rolodex-env");
    let config = RolodexConfig {
        root_folder: Some(PathBuf::from("/tmp/rolodex-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/tmp/rolodex-cli")), &config);
    assert_eq!(resolved, PathBuf::from("/tmp/rolodex-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/rolodex-env");
    let config = RolodexConfig {
        root_folder: Some(PathBuf::from("/tmp/rolodex-toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/rolodex-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = RolodexConfig {
        root_folder: Some(PathBuf::from("/tmp/rolodex-toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/rolodex-toml"));

    let resolved = resolve_root_folder(None, &RolodexConfig::default());
    assert_eq!(resolved, default_root_folder());
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_load_default_reads_platform_config() {
    let dir = tempfile::tempdir().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    // nothing written yet: defaults
    assert_eq!(RolodexConfig::load_default().unwrap(), RolodexConfig::default());

    std::fs::create_dir_all(dir.path().join("rolodex")).unwrap();
    std::fs::write(
        dir.path().join("rolodex").join("config.toml"),
        "orphan_policy = \"reject\"\n",
    )
    .unwrap();
    let config = RolodexConfig::load_default().unwrap();
    assert_eq!(config.orphan_policy, OrphanPolicy::Reject);

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
}
