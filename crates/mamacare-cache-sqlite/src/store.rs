// crates/mamacare-cache-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Profile Cache
// Description: Durable ProfileCacheStore over the profile_cache table.
// Purpose: Apply the merge rule and codec to rows in a single SQLite file.
// Dependencies: mamacare-cache-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`SqliteProfileCache`] stores one row per user in `profile_cache`:
//!
//! | column        | type    | notes                                   |
//! |---------------|---------|-----------------------------------------|
//! | `id`          | TEXT    | primary key                             |
//! | `profileData` | TEXT    | encoded profile attributes, required    |
//! | `userData`    | TEXT    | encoded session attributes, nullable    |
//! | `updatedAt`   | INTEGER | unix milliseconds of the last write     |
//!
//! Upserts read the existing row and write the merged result inside one
//! `BEGIN IMMEDIATE` transaction, so a concurrent full write cannot be lost
//! between a profile-only write's read and its write. Profile-only writes
//! that hit an existing row issue an `UPDATE` that never names `userData`.
//!
//! Columns holding the wrong storage type are reported as corruption. A full
//! write replaces such a row; a profile-only write refuses to touch it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mamacare_cache_core::CacheEntrySummary;
use mamacare_cache_core::CacheError;
use mamacare_cache_core::CacheWrite;
use mamacare_cache_core::CachedRecord;
use mamacare_cache_core::EncodedWrite;
use mamacare_cache_core::ExistingRow;
use mamacare_cache_core::MergeAction;
use mamacare_cache_core::PayloadColumn;
use mamacare_cache_core::ProfileCacheStore;
use mamacare_cache_core::Timestamp;
use mamacare_cache_core::UserId;
use mamacare_cache_core::core::codec::decode;
use mamacare_cache_core::core::codec::decode_optional;
use mamacare_cache_core::core::codec::encode_write;
use mamacare_cache_core::merge_write;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::ToSql;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::types::ValueRef;
use tracing::debug;
use tracing::warn;

use crate::handle::SqliteCacheConfig;
use crate::handle::SqliteCacheError;
use crate::handle::StorageHandle;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// `profile_cache` row with checked column types, before payload decoding.
struct StoredRow {
    /// Stored user identifier.
    id: String,
    /// Encoded profile attributes.
    profile_data: String,
    /// Encoded session attributes.
    user_data: Option<String>,
    /// Last write time.
    updated_at: Timestamp,
}

impl StoredRow {
    /// Maps a `SELECT id, profileData, userData, updatedAt` row.
    ///
    /// The outer result carries query failures; the inner one carries
    /// columns holding a value of the wrong storage type.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Self, SqliteCacheError>> {
        let id: String = row.get(0)?;
        Ok(Self::from_columns(id, row.get_ref(1)?, row.get_ref(2)?, row.get_ref(3)?))
    }

    /// Checks the storage types of the payload and timestamp columns.
    fn from_columns(
        id: String,
        profile_data: ValueRef<'_>,
        user_data: ValueRef<'_>,
        updated_at: ValueRef<'_>,
    ) -> Result<Self, SqliteCacheError> {
        let Some(profile_data) = stored_text(profile_data, PayloadColumn::ProfileData)? else {
            return Err(SqliteCacheError::Corrupt("profileData is missing".to_string()));
        };
        Ok(Self {
            id,
            profile_data,
            user_data: stored_text(user_data, PayloadColumn::UserData)?,
            updated_at: stored_timestamp(updated_at)?,
        })
    }

    /// Decodes the stored payloads into a record.
    fn decode(self) -> Result<CachedRecord, SqliteCacheError> {
        let profile_data = decode(&self.profile_data, PayloadColumn::ProfileData)
            .map_err(|err| SqliteCacheError::Corrupt(err.to_string()))?;
        let user_data = decode_optional(self.user_data.as_deref(), PayloadColumn::UserData)
            .map_err(|err| SqliteCacheError::Corrupt(err.to_string()))?;
        Ok(CachedRecord {
            id: UserId::new(self.id),
            profile_data,
            user_data,
            updated_at: self.updated_at,
        })
    }
}

/// Reads a payload column that must hold UTF-8 text or NULL.
fn stored_text(
    value: ValueRef<'_>,
    column: PayloadColumn,
) -> Result<Option<String>, SqliteCacheError> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(text.to_string()))
            .map_err(|_| {
                SqliteCacheError::Corrupt(format!("{} is not valid utf-8", column.as_str()))
            }),
        ValueRef::Integer(_) | ValueRef::Real(_) | ValueRef::Blob(_) => Err(
            SqliteCacheError::Corrupt(format!("{} is not stored as text", column.as_str())),
        ),
    }
}

/// Reads an `updatedAt` column that must hold an integer.
fn stored_timestamp(value: ValueRef<'_>) -> Result<Timestamp, SqliteCacheError> {
    match value {
        ValueRef::Integer(millis) => Ok(Timestamp::from_unix_millis(millis)),
        ValueRef::Null | ValueRef::Real(_) | ValueRef::Text(_) | ValueRef::Blob(_) => Err(
            SqliteCacheError::Corrupt("updatedAt is not stored as an integer".to_string()),
        ),
    }
}

/// Loads and decodes at most one row.
fn load_record(
    connection: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Option<CachedRecord>, SqliteCacheError> {
    connection
        .query_row(sql, params, StoredRow::from_row)
        .optional()
        .map_err(|err| SqliteCacheError::Read(err.to_string()))?
        .transpose()?
        .map(StoredRow::decode)
        .transpose()
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed profile cache.
///
/// # Invariants
/// - At most one row per user id.
/// - A profile-only write never changes a stored `userData` value.
/// - `updatedAt` never decreases for a given row.
#[derive(Debug, Clone)]
pub struct SqliteProfileCache {
    /// Shared storage handle.
    handle: Arc<StorageHandle>,
}

impl SqliteProfileCache {
    /// Creates a cache over a lazily opened database.
    ///
    /// No filesystem access happens until the first operation.
    #[must_use]
    pub fn new(config: SqliteCacheConfig) -> Self {
        Self {
            handle: Arc::new(StorageHandle::new(config)),
        }
    }

    /// Returns the storage handle.
    #[must_use]
    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }
}

impl ProfileCacheStore for SqliteProfileCache {
    fn open(&self) -> Result<(), CacheError> {
        Ok(self.handle.open()?)
    }

    fn upsert(&self, write: &CacheWrite) -> Result<(), CacheError> {
        let encoded = encode_write(write)?;
        let now = Timestamp::now();
        let action =
            self.handle.with_connection(|connection| apply_upsert(connection, &encoded, now))?;
        debug!(
            user_id = %encoded.id,
            mode = write.mode().as_str(),
            action = action.as_str(),
            "profile cache upsert"
        );
        Ok(())
    }

    fn get(&self, id: &UserId) -> Result<Option<CachedRecord>, CacheError> {
        Ok(self.handle.with_connection(|connection| {
            load_record(
                connection,
                "SELECT id, profileData, userData, updatedAt FROM profile_cache WHERE id = ?1",
                params![id.as_str()],
            )
        })?)
    }

    fn get_latest(&self) -> Result<Option<CachedRecord>, CacheError> {
        Ok(self.handle.with_connection(|connection| {
            load_record(
                connection,
                "SELECT id, profileData, userData, updatedAt FROM profile_cache ORDER BY \
                 updatedAt DESC, rowid DESC LIMIT 1",
                params![],
            )
        })?)
    }

    fn clear(&self) -> Result<(), CacheError> {
        let removed = self.handle.with_connection(|connection| {
            connection
                .execute("DELETE FROM profile_cache", params![])
                .map_err(|err| SqliteCacheError::Write(err.to_string()))
        })?;
        debug!(removed, "profile cache cleared");
        Ok(())
    }

    fn list(&self) -> Result<Vec<CacheEntrySummary>, CacheError> {
        Ok(self.handle.with_connection(list_entries)?)
    }

    fn readiness(&self) -> Result<(), CacheError> {
        Ok(self.handle.with_connection(|connection| {
            connection
                .query_row("SELECT COUNT(1) FROM profile_cache", params![], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|_| ())
                .map_err(|err| SqliteCacheError::Read(err.to_string()))
        })?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads, merges, and writes one row inside an immediate transaction.
fn apply_upsert(
    connection: &mut Connection,
    encoded: &EncodedWrite,
    now: Timestamp,
) -> Result<MergeAction, SqliteCacheError> {
    let tx = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| SqliteCacheError::Write(err.to_string()))?;
    // A profile-only UPDATE never names userData, so only updatedAt is read.
    let stored_at = tx
        .query_row(
            "SELECT updatedAt FROM profile_cache WHERE id = ?1",
            params![encoded.id.as_str()],
            |row| Ok(stored_timestamp(row.get_ref(0)?)),
        )
        .optional()
        .map_err(|err| SqliteCacheError::Write(err.to_string()))?;
    let existing = match stored_at {
        None => None,
        Some(Ok(updated_at)) => Some(ExistingRow {
            user_data: None,
            updated_at,
        }),
        Some(Err(err)) if encoded.user_data.is_some() => {
            warn!(user_id = %encoded.id, error = %err, "replacing unreadable profile cache row");
            Some(ExistingRow {
                user_data: None,
                updated_at: now,
            })
        }
        Some(Err(err)) => return Err(err),
    };
    let merged =
        merge_write(existing, encoded.profile_data.as_str(), encoded.user_data.clone(), now);
    match merged.action {
        MergeAction::Insert | MergeAction::Replace => {
            tx.execute(
                "INSERT OR REPLACE INTO profile_cache (id, profileData, userData, updatedAt) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    encoded.id.as_str(),
                    merged.profile_data,
                    merged.user_data,
                    merged.updated_at.as_unix_millis()
                ],
            )
            .map_err(|err| SqliteCacheError::Write(err.to_string()))?;
        }
        MergeAction::UpdateProfile => {
            tx.execute(
                "UPDATE profile_cache SET profileData = ?2, updatedAt = ?3 WHERE id = ?1",
                params![
                    encoded.id.as_str(),
                    merged.profile_data,
                    merged.updated_at.as_unix_millis()
                ],
            )
            .map_err(|err| SqliteCacheError::Write(err.to_string()))?;
        }
    }
    tx.commit().map_err(|err| SqliteCacheError::Write(err.to_string()))?;
    Ok(merged.action)
}

/// Lists row summaries, most recent first.
fn list_entries(connection: &mut Connection) -> Result<Vec<CacheEntrySummary>, SqliteCacheError> {
    let mut stmt = connection
        .prepare(
            "SELECT id, updatedAt, userData IS NOT NULL, length(CAST(profileData AS BLOB)), \
             COALESCE(length(CAST(userData AS BLOB)), 0) FROM profile_cache ORDER BY updatedAt \
             DESC, id ASC",
        )
        .map_err(|err| SqliteCacheError::Read(err.to_string()))?;
    let rows = stmt
        .query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                stored_timestamp(row.get_ref(1)?),
                row.get::<_, bool>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(|err| SqliteCacheError::Read(err.to_string()))?;
    let mut entries = Vec::new();
    for row in rows {
        let (id, updated_at, has_user_data, profile_bytes, user_bytes) =
            row.map_err(|err| SqliteCacheError::Read(err.to_string()))?;
        entries.push(CacheEntrySummary {
            id: UserId::new(id),
            updated_at: updated_at?,
            has_user_data,
            profile_bytes: length_to_usize(profile_bytes)?,
            user_bytes: length_to_usize(user_bytes)?,
        });
    }
    Ok(entries)
}

/// Converts an `SQLite` length to `usize`.
fn length_to_usize(length: i64) -> Result<usize, SqliteCacheError> {
    usize::try_from(length)
        .map_err(|_| SqliteCacheError::Corrupt("stored payload length is invalid".to_string()))
}
