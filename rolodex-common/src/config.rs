//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ROLODEX_ROOT_FOLDER";

/// What to do with a desired item whose row id matches no existing row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Drop the item without writing it (legacy behavior)
    #[default]
    Ignore,
    /// Treat the stale id as a new item and insert it
    Insert,
    /// Fail planning with an orphaned-item error
    Reject,
}

/// Whether creating a contact always writes a birthday row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthdayOnCreate {
    /// Insert a birthday row even when none is given (legacy behavior)
    #[default]
    Always,
    /// Only insert when the desired birthday is present
    WhenPresent,
}

/// Settings read from `config.toml`
///
/// Every field has a default, so a missing or partial file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolodexConfig {
    pub root_folder: Option<PathBuf>,
    pub database_file: String,
    pub log_level: String,
    pub busy_timeout_ms: u64,
    pub commit_timeout_ms: u64,
    pub orphan_policy: OrphanPolicy,
    pub birthday_on_create: BirthdayOnCreate,
    pub event_capacity: usize,
}

impl Default for RolodexConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            database_file: "rolodex.db".to_string(),
            log_level: "info".to_string(),
            busy_timeout_ms: 5000,
            commit_timeout_ms: 10_000,
            orphan_policy: OrphanPolicy::Ignore,
            birthday_on_create: BirthdayOnCreate::Always,
            event_capacity: 100,
        }
    }
}

impl RolodexConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from a file
    ///
    /// A missing file is not an error: a warning is logged and defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the platform config location, falling back to defaults
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Database file inside the resolved root folder
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.database_file)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &RolodexConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file: `<config dir>/rolodex/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rolodex").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("rolodex"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/rolodex"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("rolodex"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/rolodex"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("rolodex"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\rolodex"))
    } else {
        PathBuf::from("./rolodex_data")
    }
}
