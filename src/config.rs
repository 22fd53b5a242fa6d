//! Settings loaded from `config.toml`.
//!
//! Every key is optional. A missing file yields the defaults, and relative
//! locations (database, log file) resolve against the platform data
//! directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub(crate) const CONFIG_ENV: &str = "FISCELLA_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) storage: StorageConfig,

    #[serde(default)]
    pub(crate) logging: LoggingConfig,

    #[serde(default)]
    pub(crate) ui: UiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StorageConfig {
    pub(crate) database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub(crate) level: String,

    pub(crate) file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub(crate) tick_rate_ms: u64,
}

fn default_tick_rate() -> u64 {
    250
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

/// Where Fiscella keeps its files on this machine.
#[derive(Debug, Clone)]
pub(crate) struct Paths {
    pub(crate) config_file: PathBuf,
    pub(crate) data_dir: PathBuf,
}

impl Paths {
    /// Platform directories, with `FISCELLA_CONFIG` overriding the config
    /// file location.
    pub(crate) fn discover() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "fiscella", "Fiscella")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let override_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        Ok(Self {
            config_file: override_path
                .unwrap_or_else(|| proj_dirs.config_dir().join("config.toml")),
            data_dir: proj_dirs.data_dir().to_path_buf(),
        })
    }

    pub(crate) fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir.display()
            )
        })
    }

    fn resolve(&self, path: Option<&Path>, default_name: &str) -> PathBuf {
        match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.data_dir.join(p),
            None => self.data_dir.join(default_name),
        }
    }
}

impl Config {
    /// Read `path`. A file that does not exist means all defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read config: {}", path.display())))
            }
        };
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub(crate) fn database_path(&self, paths: &Paths) -> PathBuf {
        paths.resolve(self.storage.database.as_deref(), "fiscella.db")
    }

    pub(crate) fn log_path(&self, paths: &Paths) -> PathBuf {
        paths.resolve(self.logging.file.as_deref(), "fiscella.log")
    }

    pub(crate) fn tick_rate(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ui.tick_rate_ms.max(10))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
