// crates/mamacare-cache-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Profile Cache
// Description: Process-local ProfileCacheStore for tests and ephemeral sessions.
// Purpose: Apply the same validation and merge rule as durable backends.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryProfileCache`] keeps records in a mutex-guarded map. It enforces
//! the same id and payload limits as the `SQLite` backend by running writes
//! through [`encode_write`], so tests against it exercise the real contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::CacheEntrySummary;
use crate::core::CacheWrite;
use crate::core::CachedRecord;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::codec::PayloadColumn;
use crate::core::codec::encode;
use crate::core::codec::encode_write;
use crate::interfaces::CacheError;
use crate::interfaces::ProfileCacheStore;
use crate::runtime::merge::ExistingRow;
use crate::runtime::merge::merge_write;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record map keyed by user id.
type RecordMap = BTreeMap<UserId, CachedRecord>;

/// In-memory profile cache.
///
/// # Invariants
/// - One entry per [`UserId`].
#[derive(Debug, Default)]
pub struct InMemoryProfileCache {
    /// Cached records keyed by user id.
    records: Mutex<RecordMap>,
}

impl InMemoryProfileCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the record map.
    fn lock(&self) -> Result<MutexGuard<'_, RecordMap>, CacheError> {
        self.records
            .lock()
            .map_err(|_| CacheError::Initialization("in-memory cache mutex poisoned".to_string()))
    }
}

impl ProfileCacheStore for InMemoryProfileCache {
    fn upsert(&self, write: &CacheWrite) -> Result<(), CacheError> {
        encode_write(write)?;
        let mut records = self.lock()?;
        let existing = records.get(&write.id).map(|record| ExistingRow {
            user_data: record.user_data.clone(),
            updated_at: record.updated_at,
        });
        let merged = merge_write(
            existing,
            write.profile_data.clone(),
            write.user_data.clone(),
            Timestamp::now(),
        );
        records.insert(
            write.id.clone(),
            CachedRecord {
                id: write.id.clone(),
                profile_data: merged.profile_data,
                user_data: merged.user_data,
                updated_at: merged.updated_at,
            },
        );
        drop(records);
        Ok(())
    }

    fn get(&self, id: &UserId) -> Result<Option<CachedRecord>, CacheError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn get_latest(&self) -> Result<Option<CachedRecord>, CacheError> {
        Ok(self.lock()?.values().max_by_key(|record| record.updated_at).cloned())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }

    fn list(&self) -> Result<Vec<CacheEntrySummary>, CacheError> {
        let records = self.lock()?;
        let mut summaries = records
            .values()
            .map(|record| -> Result<CacheEntrySummary, CacheError> {
                let profile_bytes = encode(&record.profile_data, PayloadColumn::ProfileData)?.len();
                let user_bytes = match &record.user_data {
                    Some(user_data) => encode(user_data, PayloadColumn::UserData)?.len(),
                    None => 0,
                };
                Ok(CacheEntrySummary {
                    id: record.id.clone(),
                    updated_at: record.updated_at,
                    has_user_data: record.user_data.is_some(),
                    profile_bytes,
                    user_bytes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        drop(records);
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }
}
