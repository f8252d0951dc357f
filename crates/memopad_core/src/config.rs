//! Runtime configuration for memopad.
//!
//! # Responsibility
//! - Describe the storage key, debounce window and on-disk locations.
//! - Load overrides from an optional TOML file.
//!
//! # Invariants
//! - `quiet_period_ms` is strictly positive after `validate()`.
//! - `storage_key` is never blank after `validate()`.

use crate::logging::default_log_level;
use crate::persist::DebounceScope;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storage key the memo collection is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "memo";
/// Trailing quiet period before a burst of edits is written.
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 5000;
const DEFAULT_DB_FILE_NAME: &str = "memopad.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemopadConfig {
    /// Key the whole memo collection is stored under.
    pub storage_key: String,
    /// Debounce window in milliseconds.
    pub quiet_period_ms: u64,
    /// Whether countdowns are tracked per key or once per gate.
    pub debounce_scope: DebounceScope,
    /// SQLite store file.
    pub db_path: PathBuf,
    /// Directory for rotated log files.
    pub log_dir: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for MemopadConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            debounce_scope: DebounceScope::default(),
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level().to_string(),
        }
    }
}

impl MemopadConfig {
    /// Loads and validates a TOML config file. Missing fields keep defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key cannot be blank".to_string()));
        }
        if self.quiet_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "quiet_period_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MemopadConfig, DEFAULT_QUIET_PERIOD_MS, DEFAULT_STORAGE_KEY};
    use crate::persist::DebounceScope;
    use std::time::Duration;

    #[test]
    fn defaults_match_browser_app() {
        let config = MemopadConfig::default();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.quiet_period(), Duration::from_millis(DEFAULT_QUIET_PERIOD_MS));
        assert_eq!(config.debounce_scope, DebounceScope::PerKey);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = MemopadConfig::from_toml_str(
            "quiet_period_ms = 250\ndebounce_scope = \"global\"\n",
        )
        .unwrap();
        assert_eq!(config.quiet_period_ms, 250);
        assert_eq!(config.debounce_scope, DebounceScope::Global);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn zero_quiet_period_is_invalid() {
        let err = MemopadConfig::from_toml_str("quiet_period_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_scope_fails_to_parse() {
        let err = MemopadConfig::from_toml_str("debounce_scope = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn from_file_reports_path_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = MemopadConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
