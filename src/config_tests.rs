#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::*;

fn paths(dir: &Path) -> Paths {
    Paths {
        config_file: dir.join("config.toml"),
        data_dir: dir.join("data"),
    }
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    let config = Config::load(&paths.config_file).unwrap();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.tick_rate(), Duration::from_millis(250));
    assert_eq!(config.database_path(&paths), paths.data_dir.join("fiscella.db"));
    assert_eq!(config.log_path(&paths), paths.data_dir.join("fiscella.log"));
}

#[test]
fn test_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    let db = dir.path().join("elsewhere.db");
    std::fs::write(
        &paths.config_file,
        format!(
            r#"
[storage]
database = "{}"

[logging]
level = "fiscella=debug"
file = "logs/app.log"

[ui]
tick_rate_ms = 100
"#,
            db.display()
        ),
    )
    .unwrap();

    let config = Config::load(&paths.config_file).unwrap();
    assert_eq!(config.database_path(&paths), db);
    assert_eq!(config.logging.level, "fiscella=debug");
    assert_eq!(
        config.log_path(&paths),
        paths.data_dir.join(PathBuf::from("logs/app.log"))
    );
    assert_eq!(config.tick_rate(), Duration::from_millis(100));
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    std::fs::write(&paths.config_file, "[logging]\nlevel = \"warn\"\n").unwrap();

    let config = Config::load(&paths.config_file).unwrap();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.file, None);
    assert_eq!(config.ui.tick_rate_ms, 250);
    assert_eq!(config.storage.database, None);
}

#[test]
fn test_tick_rate_has_a_floor() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    std::fs::write(&paths.config_file, "[ui]\ntick_rate_ms = 0\n").unwrap();

    let config = Config::load(&paths.config_file).unwrap();
    assert_eq!(config.tick_rate(), Duration::from_millis(10));
}

#[test]
fn test_malformed_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    std::fs::write(&paths.config_file, "[ui]\ntick_rate_ms = \"fast\"\n").unwrap();

    let err = Config::load(&paths.config_file).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse config:"));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_ensure_data_dir_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(dir.path());
    assert!(!paths.data_dir.exists());
    paths.ensure_data_dir().unwrap();
    assert!(paths.data_dir.is_dir());
}

// The only test that touches the variable, so no other test can observe it.
#[test]
fn test_config_env_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let custom = dir.path().join("custom.toml");
    std::fs::write(&custom, "[ui]\ntick_rate_ms = 40\n").unwrap();

    std::env::set_var(CONFIG_ENV, &custom);
    let overridden = Paths::discover();
    std::env::remove_var(CONFIG_ENV);

    let overridden = overridden.unwrap();
    assert_eq!(overridden.config_file, custom);
    let config = Config::load(&overridden.config_file).unwrap();
    assert_eq!(config.tick_rate(), Duration::from_millis(40));

    let default = Paths::discover().unwrap();
    assert_ne!(default.config_file, custom);
    assert!(default.config_file.ends_with("config.toml"));
    assert_eq!(default.data_dir, overridden.data_dir);
}
