// crates/mamacare-cache-core/src/runtime/sync.rs
// ============================================================================
// Module: Profile Write-Through
// Description: Session-side coordination between the backend and the cache.
// Purpose: Mirror successful remote writes locally and restore at cold start.
// Dependencies: thiserror, tracing, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`ProfileSync`] is the glue the authentication/session layer uses:
//! - profile edits go to the backend first and are mirrored into the cache
//!   as profile-only writes once the backend accepts them;
//! - session refreshes fetched from the backend are cached as full writes;
//! - cold start restores the current user's record, or the most recent one
//!   when the user is not yet known;
//! - sign-out clears the cache.
//!
//! The cache is never a source of truth here: a remote failure is returned to
//! the caller and the cache is left as it was.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::Attributes;
use crate::core::CachedRecord;
use crate::core::UserId;
use crate::interfaces::RemoteError;
use crate::interfaces::RemoteProfileStore;
use crate::runtime::boundary::OfflineProfileCache;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Profile write-through errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Remote profile store rejected or could not take the update.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Coordinates the remote profile store and the offline cache.
#[derive(Clone)]
pub struct ProfileSync {
    /// Remote profile endpoint.
    remote: Arc<dyn RemoteProfileStore + Send + Sync>,
    /// Non-fatal local cache.
    cache: OfflineProfileCache,
}

impl ProfileSync {
    /// Creates a coordinator over a remote store and a cache.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteProfileStore + Send + Sync>,
        cache: OfflineProfileCache,
    ) -> Self {
        Self {
            remote,
            cache,
        }
    }

    /// Saves profile fields remotely, then mirrors them into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Remote`] when the backend write fails; the cache
    /// is not touched in that case.
    pub async fn save_profile(&self, id: &UserId, profile: Attributes) -> Result<(), SyncError> {
        if let Err(err) = self.remote.upsert_remote(id, &profile).await {
            warn!(user_id = %id, error = %err, "remote profile update failed, cache unchanged");
            return Err(err.into());
        }
        self.cache.upsert(id.clone(), profile, None).await;
        Ok(())
    }

    /// Caches a profile and session snapshot fetched from the backend.
    pub async fn record_session(&self, id: &UserId, profile: Attributes, user: Attributes) {
        self.cache.upsert(id.clone(), profile, Some(user)).await;
    }

    /// Restores the last-known-good record at cold start.
    ///
    /// Uses the current user's record when the user is known, otherwise the
    /// most recently written record.
    pub async fn restore(&self, current_user: Option<&UserId>) -> Option<CachedRecord> {
        let record = match current_user {
            Some(id) => self.cache.get(id).await,
            None => self.cache.get_latest().await,
        };
        if let Some(record) = &record {
            debug!(user_id = %record.id, "restored cached profile");
        }
        record
    }

    /// Clears cached data on sign-out.
    pub async fn sign_out(&self) {
        self.cache.clear().await;
    }
}
