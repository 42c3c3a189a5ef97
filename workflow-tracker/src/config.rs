//! Tracker configuration
//!
//! Precedence (highest to lowest):
//! 1. Command-line flags
//! 2. Environment variables (a `.env` file is loaded by the binary first)
//! 3. Config file (`--config`, else `<config dir>/config.yaml`)
//! 4. Default values

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const ENV_BASE_URL: &str = "WORKFLOW_TRACKER_BASE_URL";
pub const ENV_TOKEN: &str = "WORKFLOW_TRACKER_TOKEN";
pub const ENV_POLL_MS: &str = "WORKFLOW_TRACKER_POLL_MS";
pub const ENV_LOG: &str = "WORKFLOW_TRACKER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// Connection to the workflow execution service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. "http://localhost:3000"
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer token issued by the identity provider, passed through as-is
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status polls in milliseconds
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 2_500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive; `RUST_LOG` wins when set
    pub level: String,
    /// Log file used while the terminal UI owns the screen
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl TrackerConfig {
    /// Load configuration from file, environment and command-line overrides
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "workflow-tracker")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    pub fn default_log_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("", "", "workflow-tracker") {
            dirs.data_dir().join("workflow-tracker.log")
        } else {
            PathBuf::from(".workflow-tracker.log")
        }
    }

    /// Apply environment overrides through `lookup` (std::env in production)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            if !token.is_empty() {
                self.api.auth_token = Some(token);
            }
        }
        if let Some(raw) = lookup(ENV_POLL_MS) {
            self.polling.interval_ms = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_POLL_MS, format!("'{}' is not a number", raw)))?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.base_url {
            self.api.base_url = url.clone();
        }
        if let Some(token) = &overrides.auth_token {
            self.api.auth_token = Some(token.clone());
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.polling.interval_ms = ms;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &overrides.log_file {
            self.logging.file = Some(file.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::invalid("polling.interval_ms", "must be greater than 0"));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::invalid("api.timeout_ms", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logging
            .file
            .clone()
            .unwrap_or_else(Self::default_log_path)
    }
}
