// crates/mamacare-cache-core/tests/offline_boundary.rs
// ============================================================================
// Module: Offline Boundary Tests
// Description: Async facade and write-through coordinator behavior.
// Purpose: Ensure store failures degrade safely and remote failures gate writes.
// ============================================================================

//! Tests for `OfflineProfileCache` and `ProfileSync`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use mamacare_cache_core::Attributes;
use mamacare_cache_core::CacheEntrySummary;
use mamacare_cache_core::CacheError;
use mamacare_cache_core::CacheWrite;
use mamacare_cache_core::CachedRecord;
use mamacare_cache_core::InMemoryProfileCache;
use mamacare_cache_core::OfflineProfileCache;
use mamacare_cache_core::ProfileCacheStore;
use mamacare_cache_core::ProfileSync;
use mamacare_cache_core::RemoteError;
use mamacare_cache_core::RemoteProfileStore;
use mamacare_cache_core::SyncError;
use mamacare_cache_core::UserId;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Store whose every operation fails.
struct FailingProfileCache;

impl ProfileCacheStore for FailingProfileCache {
    fn open(&self) -> Result<(), CacheError> {
        Err(CacheError::Initialization("disk unavailable".to_string()))
    }

    fn upsert(&self, _write: &CacheWrite) -> Result<(), CacheError> {
        Err(CacheError::Write("disk full".to_string()))
    }

    fn get(&self, _id: &UserId) -> Result<Option<CachedRecord>, CacheError> {
        Err(CacheError::MalformedRecord("profileData".to_string()))
    }

    fn get_latest(&self) -> Result<Option<CachedRecord>, CacheError> {
        Err(CacheError::Initialization("disk unavailable".to_string()))
    }

    fn clear(&self) -> Result<(), CacheError> {
        Err(CacheError::Write("disk full".to_string()))
    }

    fn list(&self) -> Result<Vec<CacheEntrySummary>, CacheError> {
        Err(CacheError::Initialization("disk unavailable".to_string()))
    }
}

/// Remote store that records calls and can be told to fail.
#[derive(Default)]
struct RecordingRemote {
    /// Recorded upserts.
    calls: Mutex<Vec<(UserId, Attributes)>>,
    /// Whether upserts should fail.
    fail: bool,
}

#[async_trait]
impl RemoteProfileStore for RecordingRemote {
    async fn upsert_remote(&self, id: &UserId, fields: &Attributes) -> Result<(), RemoteError> {
        if self.fail {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        self.calls.lock().unwrap().push((id.clone(), fields.clone()));
        Ok(())
    }
}

fn profile(name: &str) -> Attributes {
    Attributes::new().with("displayName", name)
}

fn session(token: &str) -> Attributes {
    Attributes::new().with("accessToken", token)
}

// ============================================================================
// SECTION: Boundary
// ============================================================================

#[tokio::test]
async fn failing_store_degrades_to_empty_cache() {
    let cache = OfflineProfileCache::from_store(FailingProfileCache);
    assert!(!cache.open().await);
    cache.upsert(UserId::new("user-a"), profile("Ama"), None).await;
    assert_eq!(cache.get(&UserId::new("user-a")).await, None);
    assert_eq!(cache.get_latest().await, None);
    cache.clear().await;
}

#[tokio::test]
async fn boundary_round_trips_through_store() {
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    assert!(cache.open().await);
    let id = UserId::new("user-a");
    cache.upsert(id.clone(), profile("Ama"), Some(session("t1"))).await;
    cache.upsert(id.clone(), profile("Ama K."), None).await;

    let record = cache.get(&id).await.expect("record");
    assert_eq!(record.profile_data, profile("Ama K."));
    assert_eq!(record.user_data, Some(session("t1")));
}

#[tokio::test]
async fn boundary_swallows_invalid_input() {
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    cache.upsert(UserId::new(""), profile("nobody"), None).await;
    assert_eq!(cache.get_latest().await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_write_future_still_applies_write() {
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    let id = UserId::new("user-a");
    drop(cache.upsert(id.clone(), profile("Ama"), Some(session("t1"))));

    let mut record = None;
    for _ in 0 .. 200 {
        record = cache.get(&id).await;
        if record.is_some() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let record = record.expect("write should land without being awaited");
    assert_eq!(record.user_data, Some(session("t1")));
}

// ============================================================================
// SECTION: Write-Through
// ============================================================================

#[tokio::test]
async fn save_profile_mirrors_after_remote_success() {
    let remote = Arc::new(RecordingRemote::default());
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    let sync = ProfileSync::new(remote.clone(), cache);
    let id = UserId::new("user-a");

    sync.record_session(&id, profile("Ama"), session("t1")).await;
    sync.save_profile(&id, profile("Ama K.")).await.unwrap();

    assert_eq!(remote.calls.lock().unwrap().as_slice(), &[(id.clone(), profile("Ama K."))]);
    let record = sync.restore(Some(&id)).await.expect("record");
    assert_eq!(record.profile_data, profile("Ama K."));
    assert_eq!(record.user_data, Some(session("t1")));
}

#[tokio::test]
async fn save_profile_leaves_cache_untouched_on_remote_failure() {
    let remote = Arc::new(RecordingRemote {
        calls: Mutex::new(Vec::new()),
        fail: true,
    });
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    let sync = ProfileSync::new(remote, cache);
    let id = UserId::new("user-a");
    sync.record_session(&id, profile("Ama"), session("t1")).await;

    let err = sync.save_profile(&id, profile("Ama K.")).await.unwrap_err();
    assert!(matches!(err, SyncError::Remote(RemoteError::Unavailable(_))));
    let record = sync.restore(Some(&id)).await.expect("record");
    assert_eq!(record.profile_data, profile("Ama"));
}

#[tokio::test]
async fn restore_without_known_user_uses_latest_and_sign_out_clears() {
    let remote = Arc::new(RecordingRemote::default());
    let cache = OfflineProfileCache::from_store(InMemoryProfileCache::new());
    let sync = ProfileSync::new(remote, cache);
    let id = UserId::new("user-a");
    sync.record_session(&id, profile("Ama"), session("t1")).await;

    let restored = sync.restore(None).await.expect("latest");
    assert_eq!(restored.id, id);

    sync.sign_out().await;
    assert_eq!(sync.restore(None).await, None);
    assert_eq!(sync.restore(Some(&id)).await, None);
}
