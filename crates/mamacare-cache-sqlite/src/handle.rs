// crates/mamacare-cache-sqlite/src/handle.rs
// ============================================================================
// Module: SQLite Storage Handle
// Description: Lazily opened SQLite connection for the profile cache.
// Purpose: Acquire the database file once, create its schema, and share it.
// Dependencies: rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`StorageHandle`] owns at most one `SQLite` connection. Nothing touches
//! the filesystem until the first operation; that operation validates the
//! path, creates the parent directory, applies pragmas, and creates the
//! schema. A failed acquisition is not remembered, so the next operation
//! tries again. Once acquired, the connection is reused for the life of the
//! handle and every statement runs under its mutex.
//!
//! Security posture: database contents are untrusted input; decoding is done
//! by the store, which reports unreadable rows as corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use mamacare_cache_core::CacheError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Database file name inside the application data directory.
pub const STORE_FILE_NAME: &str = "profile_cache_v1.sqlite";
/// `SQLite` schema version for the cache.
pub const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode, for filesystems without shared memory support.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` profile cache.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteCacheConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteCacheConfig {
    /// Creates a config for an explicit database path with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }

    /// Creates a config for [`STORE_FILE_NAME`] inside a data directory.
    #[must_use]
    pub fn for_directory(directory: impl AsRef<Path>) -> Self {
        Self::for_path(directory.as_ref().join(STORE_FILE_NAME))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` profile cache errors.
///
/// # Invariants
/// - Error messages avoid embedding profile or session payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteCacheError {
    /// Filesystem error while preparing the database location.
    #[error("sqlite cache io error: {0}")]
    Io(String),
    /// Database path failed safety checks.
    #[error("sqlite cache invalid path: {0}")]
    InvalidPath(String),
    /// Connection, pragma, or schema setup failed.
    #[error("sqlite cache open error: {0}")]
    Open(String),
    /// Stored schema version is not supported.
    #[error("sqlite cache version mismatch: {0}")]
    VersionMismatch(String),
    /// Write or clear statement failed.
    #[error("sqlite cache write error: {0}")]
    Write(String),
    /// Read query failed.
    #[error("sqlite cache read error: {0}")]
    Read(String),
    /// Stored row could not be decoded.
    #[error("sqlite cache corruption: {0}")]
    Corrupt(String),
}

impl From<SqliteCacheError> for CacheError {
    fn from(error: SqliteCacheError) -> Self {
        match error {
            SqliteCacheError::Io(_)
            | SqliteCacheError::InvalidPath(_)
            | SqliteCacheError::Open(_)
            | SqliteCacheError::VersionMismatch(_) => Self::Initialization(error.to_string()),
            SqliteCacheError::Write(message) => Self::Write(message),
            SqliteCacheError::Read(message) => Self::Read(message),
            SqliteCacheError::Corrupt(message) => Self::MalformedRecord(message),
        }
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Lazily acquired `SQLite` connection.
///
/// # Invariants
/// - At most one connection is opened per handle.
/// - The schema exists whenever the connection is present.
/// - Statements are serialized through the connection mutex.
#[derive(Debug)]
pub struct StorageHandle {
    /// Store configuration.
    config: SqliteCacheConfig,
    /// Connection, present once acquisition has succeeded.
    connection: Mutex<Option<Connection>>,
}

impl StorageHandle {
    /// Creates a handle without touching the filesystem.
    #[must_use]
    pub const fn new(config: SqliteCacheConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    /// Returns true once a connection has been acquired.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.connection.lock().is_ok_and(|guard| guard.is_some())
    }

    /// Acquires the connection and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCacheError`] when the path is unusable or the database
    /// cannot be opened or initialized.
    pub fn open(&self) -> Result<(), SqliteCacheError> {
        self.with_connection(|_| Ok(()))
    }

    /// Runs an operation against the connection, acquiring it first if needed.
    ///
    /// # Errors
    ///
    /// Returns acquisition errors, or whatever the operation returns.
    pub fn with_connection<T>(
        &self,
        operation: impl FnOnce(&mut Connection) -> Result<T, SqliteCacheError>,
    ) -> Result<T, SqliteCacheError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteCacheError::Open("sqlite connection mutex poisoned".to_string()))?;
        if guard.is_none() {
            let connection = establish(&self.config)?;
            debug!(path = %self.config.path.display(), "profile cache storage opened");
            *guard = Some(connection);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(SqliteCacheError::Open("sqlite connection unavailable".to_string()));
        };
        operation(connection)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the path, opens the database, and creates the schema.
fn establish(config: &SqliteCacheConfig) -> Result<Connection, SqliteCacheError> {
    validate_store_path(&config.path)?;
    ensure_parent_dir(&config.path)?;
    let mut connection = open_connection(config)?;
    initialize_schema(&mut connection)?;
    Ok(connection)
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteCacheError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteCacheError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteCacheError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteCacheError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteCacheError::InvalidPath("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteCacheError::InvalidPath("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteCacheError::InvalidPath(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteCacheError::InvalidPath(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection and applies pragmas.
fn open_connection(config: &SqliteCacheConfig) -> Result<Connection, SqliteCacheError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout settings.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteCacheConfig,
) -> Result<(), SqliteCacheError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    Ok(())
}

/// Creates the cache schema or validates the existing version.
///
/// Table creation is idempotent, so a store whose metadata survived but whose
/// table did not is repaired rather than rejected.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteCacheError> {
    let tx = connection.transaction().map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteCacheError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS profile_cache (
            id TEXT PRIMARY KEY NOT NULL,
            profileData TEXT NOT NULL,
            userData TEXT,
            updatedAt INTEGER NOT NULL
                DEFAULT (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
        );
        CREATE INDEX IF NOT EXISTS idx_profile_cache_updated_at
            ON profile_cache (updatedAt);",
    )
    .map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    tx.commit().map_err(|err| SqliteCacheError::Open(err.to_string()))?;
    Ok(())
}
