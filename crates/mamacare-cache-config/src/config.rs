// crates/mamacare-cache-config/src/config.rs
// ============================================================================
// Module: Cache Configuration
// Description: TOML model, loading guards, and validation.
// Purpose: Turn an untrusted config file into a validated store configuration.
// Dependencies: mamacare-cache-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Resolution order for the config file is: explicit path, then
//! [`CONFIG_ENV_VAR`], then [`DEFAULT_CONFIG_NAME`] in the working directory.
//! The file is size- and encoding-checked before parsing, unknown keys are
//! rejected, and [`CacheConfig::validate`] enforces cross-field rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use mamacare_cache_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use mamacare_cache_sqlite::SqliteCacheConfig;
use mamacare_cache_sqlite::SqliteJournalMode;
use mamacare_cache_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "mamacare-cache.toml";
/// Environment variable naming an alternate config file.
pub const CONFIG_ENV_VAR: &str = "MAMACARE_CACHE_CONFIG";
/// Maximum accepted config file size.
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;
/// Upper bound for `store.busy_timeout_ms`.
pub const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;
/// Maximum total config path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single config path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file is not valid TOML for this model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config input failed a guard or validation rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Log level used when no environment filter is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    #[default]
    Warn,
    /// Informational events.
    Info,
    /// Debug events.
    Debug,
    /// Everything.
    Trace,
    /// Logging disabled.
    Off,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Off => "off",
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default log level.
    #[serde(default)]
    pub level: LogLevel,
}

/// `[store]` section.
///
/// # Invariants
/// - Exactly one of `directory` and `path` is set after validation.
/// - `busy_timeout_ms` is within `1..=MAX_BUSY_TIMEOUT_MS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Data directory holding the versioned cache file.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Explicit database file path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates the store section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the location is ambiguous or
    /// missing, or the busy timeout is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.directory, &self.path) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "store.directory and store.path are mutually exclusive".to_string(),
                ));
            }
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "store.directory or store.path must be set".to_string(),
                ));
            }
            (Some(location), None) | (None, Some(location)) => {
                if location.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid(
                        "store location must not be empty".to_string(),
                    ));
                }
            }
        }
        if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be between 1 and {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Store location and tuning.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging defaults.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl CacheConfig {
    /// Loads and validates configuration.
    ///
    /// When `path` is `None`, [`CONFIG_ENV_VAR`] and then
    /// [`DEFAULT_CONFIG_NAME`] are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file fails a guard, cannot be read or
    /// parsed, or does not validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_value = std::env::var_os(CONFIG_ENV_VAR);
        let resolved = resolve_config_path(path, env_value.as_deref());
        validate_config_path(&resolved)?;
        let metadata = fs::metadata(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_BYTES {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration for an explicit database file.
    #[must_use]
    pub fn for_store_path(path: impl Into<PathBuf>) -> Self {
        Self::default().with_store_path(path)
    }

    /// Replaces the configured store location with an explicit file path.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.directory = None;
        self.store.path = Some(path.into());
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()
    }

    /// Produces the `SQLite` store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the store section is invalid.
    pub fn store_config(&self) -> Result<SqliteCacheConfig, ConfigError> {
        self.store.validate()?;
        let mut store = match (&self.store.path, &self.store.directory) {
            (Some(path), _) => SqliteCacheConfig::for_path(path),
            (None, Some(directory)) => SqliteCacheConfig::for_directory(directory),
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "store.directory or store.path must be set".to_string(),
                ));
            }
        };
        store.busy_timeout_ms = self.store.busy_timeout_ms;
        store.journal_mode = self.store.journal_mode;
        store.sync_mode = self.store.sync_mode;
        Ok(store)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config file path from an explicit path or environment value.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<&OsStr>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_NAME),
    }
}

/// Rejects config paths over the length limits.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Returns an annotated example config file.
#[must_use]
pub fn config_toml_example() -> String {
    format!(
        "# {DEFAULT_CONFIG_NAME}\n\
         [store]\n\
         # Data directory; the cache file is created inside it.\n\
         directory = \"./data\"\n\
         # Alternatively, an explicit database file (mutually exclusive with directory).\n\
         # path = \"./data/profile_cache_v1.sqlite\"\n\
         busy_timeout_ms = {DEFAULT_BUSY_TIMEOUT_MS}\n\
         journal_mode = \"wal\"\n\
         sync_mode = \"full\"\n\
         \n\
         [logging]\n\
         level = \"warn\"\n"
    )
}
