// crates/mamacare-cache-core/src/runtime/boundary.rs
// ============================================================================
// Module: Offline Cache Boundary
// Description: Async, non-fatal facade over a ProfileCacheStore.
// Purpose: Ensure cache failures degrade to "nothing cached" for callers.
// Dependencies: tokio, tracing, crate::interfaces
// ============================================================================

//! ## Overview
//! [`OfflineProfileCache`] is what session and UI code call. Each operation
//! runs the typed store call on the blocking pool, so the caller is never
//! stalled on local I/O. Failures are logged and converted: writes become
//! no-ops that leave the cache unchanged, reads become `None`.
//!
//! [`OfflineProfileCache::upsert`] hands the write to the blocking pool before
//! it returns, so a caller may drop the returned future without losing the
//! write. Awaiting it only waits for completion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::Attributes;
use crate::core::CacheWrite;
use crate::core::CachedRecord;
use crate::core::UserId;
use crate::interfaces::CacheError;
use crate::interfaces::ProfileCacheStore;
use crate::interfaces::SharedProfileCacheStore;

// ============================================================================
// SECTION: Boundary
// ============================================================================

/// Non-fatal async facade over a cache store.
///
/// # Invariants
/// - No method returns an error or panics on store failure.
#[derive(Clone)]
pub struct OfflineProfileCache {
    /// Typed store the facade delegates to.
    store: SharedProfileCacheStore,
}

impl OfflineProfileCache {
    /// Wraps a shared store.
    #[must_use]
    pub const fn new(store: SharedProfileCacheStore) -> Self {
        Self {
            store,
        }
    }

    /// Wraps a concrete store.
    #[must_use]
    pub fn from_store(store: impl ProfileCacheStore + Send + Sync + 'static) -> Self {
        Self::new(SharedProfileCacheStore::from_store(store))
    }

    /// Opens the backing store; returns whether the cache is usable.
    pub async fn open(&self) -> bool {
        self.run("open", |store| store.open()).await.is_some()
    }

    /// Writes profile data, plus session data when supplied.
    ///
    /// The write is spawned immediately; dropping the returned future leaves
    /// it running. Must be called from within a Tokio runtime.
    pub fn upsert(
        &self,
        id: UserId,
        profile_data: Attributes,
        user_data: Option<Attributes>,
    ) -> impl Future<Output = ()> + Send + use<> {
        let write = CacheWrite::new(id, profile_data, user_data);
        let mode = write.mode();
        let id = write.id.clone();
        let task = self.spawn(move |store| store.upsert(&write));
        async move {
            if settle("upsert", task).await.is_some() {
                debug!(user_id = %id, mode = mode.as_str(), "profile cache write applied");
            }
        }
    }

    /// Loads the cached record for a user, or `None` when unavailable.
    pub async fn get(&self, id: &UserId) -> Option<CachedRecord> {
        let id = id.clone();
        self.run("get", move |store| store.get(&id)).await.flatten()
    }

    /// Loads the most recently written record, or `None` when unavailable.
    pub async fn get_latest(&self) -> Option<CachedRecord> {
        self.run("get_latest", |store| store.get_latest()).await.flatten()
    }

    /// Removes every cached record.
    pub async fn clear(&self) {
        if self.run("clear", |store| store.clear()).await.is_some() {
            info!("profile cache cleared");
        }
    }

    /// Runs a store operation on the blocking pool and absorbs failures.
    async fn run<T, F>(&self, operation: &'static str, call: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&SharedProfileCacheStore) -> Result<T, CacheError> + Send + 'static,
    {
        settle(operation, self.spawn(call)).await
    }

    /// Starts a store operation on the blocking pool.
    fn spawn<T, F>(&self, call: F) -> JoinHandle<Result<T, CacheError>>
    where
        T: Send + 'static,
        F: FnOnce(&SharedProfileCacheStore) -> Result<T, CacheError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || call(&store))
    }
}

/// Waits for a spawned store operation and logs any failure.
async fn settle<T>(operation: &'static str, task: JoinHandle<Result<T, CacheError>>) -> Option<T> {
    match task.await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(operation, kind = err.kind(), error = %err, "profile cache operation failed");
            None
        }
        Err(err) => {
            warn!(operation, error = %err, "profile cache task did not complete");
            None
        }
    }
}
