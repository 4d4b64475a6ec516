//! Process configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path and logging options for FFI and CLI hosts.
//!
//! # Invariants
//! - Blank variables behave as unset.
//! - A configured log directory is always absolute.

use crate::logging::{default_log_level, normalize_log_dir, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "APPTAREAS_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "APPTAREAS_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "APPTAREAS_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "apptareas.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    LogDir(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LogDir(err) => write!(f, "{LOG_DIR_ENV}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LogDir(err) => Some(err),
        }
    }
}

/// Host-level settings shared by the FFI facade and the CLI probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is skipped when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            config.log_dir = Some(normalize_log_dir(&dir).map_err(ConfigError::LogDir)?);
        }
        Ok(config)
    }
}
