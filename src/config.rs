//! Import tuning configuration.
//!
//! Settings are loaded from a TOML file with the following structure:
//!
//! ```toml
//! [import]
//! pool_size = 10
//! batch_size = 5
//! exiftool = "exiftool"
//! ```
//!
//! Every field is optional; a missing file (when no path was given
//! explicitly) means defaults. The pool is sized for the latency of the
//! external metadata tool, not for CPU count.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A setting has a value the importer cannot run with.
    InvalidValue(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub import: ImportSettings,
}

/// Tuning knobs for a single import job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Number of concurrent workers. Defaults to 10.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Number of files handed to a worker at a time. Defaults to 5.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Name or path of the exiftool binary. Defaults to "exiftool".
    #[serde(default = "default_exiftool")]
    pub exiftool: String,
}

fn default_pool_size() -> usize {
    10
}

fn default_batch_size() -> usize {
    5
}

fn default_exiftool() -> String {
    "exiftool".to_string()
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            pool_size: default_pool_size(),
            batch_size: default_batch_size(),
            exiftool: default_exiftool(),
        }
    }
}

impl ImportConfig {
    /// Loads configuration from an explicit path, or from well-known
    /// locations when none is given.
    ///
    /// Lookup order without an explicit path: `.snapsortrc.toml` in the
    /// current directory, then `$HOME/.config/snapsort/config.toml`, then
    /// built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if an explicit path does not
    /// exist, `ConfigError::ConfigInvalid` on TOML errors, and
    /// `ConfigError::InvalidValue` if a setting fails validation.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".snapsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("snapsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.import.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.import.batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
