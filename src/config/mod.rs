//! Configuration for the Headliner engine.
//!
//! Read from `~/.config/headliner/config.toml` at startup. If the file doesn't
//! exist, a commented default is written and the built-in values are used.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::DEFAULT_REFRESH_INTERVAL_MIN;
use crate::fetcher::parallel::DEFAULT_WORKERS;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll: PollConfig,
    pub store: StoreConfig,
}

/// Knobs for the polling engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Used when the store holds no valid `refreshInterval`.
    pub default_refresh_interval_min: u64,
    pub fetch_timeout_ms: u64,
    pub max_concurrency: usize,
    pub user_agent: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            default_refresh_interval_min: DEFAULT_REFRESH_INTERVAL_MIN,
            fetch_timeout_ms: 30_000,
            max_concurrency: DEFAULT_WORKERS,
            user_agent: concat!("headliner/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. Empty means the platform data directory.
    pub path: String,
}

impl StoreConfig {
    pub fn path(&self) -> Option<PathBuf> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Missing fields in the file fall back to their defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, creating a commented default if absent.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        if config.poll.default_refresh_interval_min == 0 {
            return Err(ConfigError::Invalid {
                path: config_path.to_path_buf(),
                reason: "poll.default_refresh_interval_min must be at least 1".into(),
            });
        }

        Ok(config)
    }

    /// Get the default config file path: `~/.config/headliner/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("headliner").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Headliner Configuration
#
# Feeds, the selection, and the refresh interval live in the store and
# can be changed at runtime with `headliner feed add`, `headliner select`,
# and `headliner interval`. This file only holds process-level settings.

[poll]
# Refresh interval in minutes, used until one is set in the store
default_refresh_interval_min = 15

# Per-feed request timeout in milliseconds
fetch_timeout_ms = 30000

# Maximum feeds fetched at the same time
max_concurrency = 10

# User-Agent header sent with every request
user_agent = "headliner/0.1.0"

[store]
# SQLite database file (empty = platform data directory)
path = ""
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
