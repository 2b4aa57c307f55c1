//! Configuration management for snapshot operations.
//!
//! Loads configuration from a TOML file; command-line flags override it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::errors::{Result, SnapshotError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory tree being protected
    pub source: PathBuf,

    /// Directory holding `backup_YYYYMMDD_HHMMSS` snapshots
    pub backup_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::from_io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| SnapshotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject path combinations that cannot work regardless of disk state
    pub fn validate(&self) -> Result<()> {
        if self.paths.source.as_os_str().is_empty() {
            return Err(SnapshotError::Config("paths.source is empty".into()));
        }
        if self.paths.backup_root.as_os_str().is_empty() {
            return Err(SnapshotError::Config("paths.backup_root is empty".into()));
        }
        if self.paths.source == self.paths.backup_root {
            return Err(SnapshotError::Config(format!(
                "source and backup_root are the same directory: {}",
                self.paths.source.display()
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig {
                source: PathBuf::from("data_source"),
                backup_root: PathBuf::from("data_backup"),
            },
            log: LogConfig::default(),
        }
    }
}
