//! # Sync Configuration
//!
//! Run settings loaded from environment variables, with the template directory
//! falling back to the first positional argument.

use crate::constants::{
    DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_SECRETS_DIR,
    ENV_SYNC_MODE,
};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no template directory given: set SECRETS_DIR or pass it as the first argument")]
    MissingSecretsDir,
    #[error("unknown SYNC_MODE '{0}' (expected 'apply' or 'metadata')")]
    UnknownMode(String),
    #[error("unknown LOG_FORMAT '{0}' (expected 'json' or 'text')")]
    UnknownLogFormat(String),
}

/// How reconciled secrets are written back to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Create, update, or delete-and-recreate each secret
    #[default]
    Apply,
    /// Patch labels and annotations only; never touches `data`
    Metadata,
}

impl SyncMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Apply => "apply",
            SyncMode::Metadata => "metadata",
        }
    }
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apply" => Ok(SyncMode::Apply),
            "metadata" => Ok(SyncMode::Metadata),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(ConfigError::UnknownLogFormat(other.to_string())),
        }
    }
}

/// Settings for a single sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Directory holding the template files (not searched recursively)
    pub secrets_dir: PathBuf,
    pub mode: SyncMode,
    /// Log level for this crate, used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl SyncConfig {
    /// Load configuration from the process environment.
    ///
    /// `SECRETS_DIR` wins over `positional`; an empty value counts as unset.
    pub fn from_env(positional: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), positional)
    }

    /// Same as [`SyncConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F, positional: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secrets_dir = non_empty(ENV_SECRETS_DIR)
            .map(PathBuf::from)
            .or_else(|| positional.filter(|p| !p.as_os_str().is_empty()))
            .ok_or(ConfigError::MissingSecretsDir)?;

        let mode = non_empty(ENV_SYNC_MODE)
            .map(|v| v.parse::<SyncMode>())
            .transpose()?
            .unwrap_or_default();

        let log_format = non_empty(ENV_LOG_FORMAT)
            .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string())
            .parse::<LogFormat>()?;

        Ok(Self {
            secrets_dir,
            mode,
            log_level: non_empty(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format,
        })
    }
}
