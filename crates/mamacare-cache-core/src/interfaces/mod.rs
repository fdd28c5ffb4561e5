// crates/mamacare-cache-core/src/interfaces/mod.rs
// ============================================================================
// Module: Cache Interfaces
// Description: Backend-agnostic contracts for the profile cache and remote store.
// Purpose: Define the seams between session logic, storage, and the backend.
// Dependencies: async-trait, thiserror, crate::core
// ============================================================================

//! ## Overview
//! [`ProfileCacheStore`] is the typed contract every cache backend
//! implements. It reports failures through [`CacheError`] so corruption can
//! be told apart from "never cached". The non-fatal boundary that callers use
//! lives in [`crate::runtime::OfflineProfileCache`].
//!
//! [`RemoteProfileStore`] is the consumed backend contract: a keyed upsert
//! whose success gates the local mirror write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Attributes;
use crate::core::CacheEntrySummary;
use crate::core::CacheWrite;
use crate::core::CachedRecord;
use crate::core::UserId;
use crate::core::codec::CodecError;

// ============================================================================
// SECTION: Cache Store
// ============================================================================

/// Profile cache errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed profile or session payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Backing storage could not be opened or its schema created.
    #[error("profile cache initialization failed: {0}")]
    Initialization(String),
    /// A statement failed while writing or clearing.
    #[error("profile cache write failed: {0}")]
    Write(String),
    /// A query failed while reading.
    #[error("profile cache read failed: {0}")]
    Read(String),
    /// Stored text did not decode into a record.
    #[error("profile cache record malformed: {0}")]
    MalformedRecord(String),
    /// Caller input was rejected before reaching storage.
    #[error("profile cache invalid input: {0}")]
    Invalid(String),
}

impl CacheError {
    /// Returns a stable label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "initialization",
            Self::Write(_) => "write",
            Self::Read(_) => "read",
            Self::MalformedRecord(_) => "malformed_record",
            Self::Invalid(_) => "invalid",
        }
    }
}

impl From<CodecError> for CacheError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::Malformed {
                ..
            } => Self::MalformedRecord(error.to_string()),
            CodecError::Encode {
                ..
            } => Self::Write(error.to_string()),
        }
    }
}

/// Persistent store holding one cached record per user.
pub trait ProfileCacheStore {
    /// Acquires the backing storage and ensures its schema exists.
    ///
    /// Repeated calls are no-ops beyond connection acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Initialization`] when storage is unavailable.
    fn open(&self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Writes a record, merging profile-only writes with stored session data.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the write is rejected or fails; the stored
    /// row is left unchanged.
    fn upsert(&self, write: &CacheWrite) -> Result<(), CacheError>;

    /// Loads the record for a user.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MalformedRecord`] when the stored row does not
    /// decode, or another [`CacheError`] when storage fails.
    fn get(&self, id: &UserId) -> Result<Option<CachedRecord>, CacheError>;

    /// Loads the most recently written record across all users.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when storage fails or the row does not decode.
    fn get_latest(&self) -> Result<Option<CachedRecord>, CacheError>;

    /// Removes every cached record.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when storage fails.
    fn clear(&self) -> Result<(), CacheError>;

    /// Lists cached records, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when storage fails.
    fn list(&self) -> Result<Vec<CacheEntrySummary>, CacheError>;

    /// Reports store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Shared, thread-safe handle to a cache store.
#[derive(Clone)]
pub struct SharedProfileCacheStore {
    /// Wrapped store implementation.
    inner: Arc<dyn ProfileCacheStore + Send + Sync>,
}

impl SharedProfileCacheStore {
    /// Wraps a store implementation.
    #[must_use]
    pub fn from_store(store: impl ProfileCacheStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl ProfileCacheStore for SharedProfileCacheStore {
    fn open(&self) -> Result<(), CacheError> {
        self.inner.open()
    }

    fn upsert(&self, write: &CacheWrite) -> Result<(), CacheError> {
        self.inner.upsert(write)
    }

    fn get(&self, id: &UserId) -> Result<Option<CachedRecord>, CacheError> {
        self.inner.get(id)
    }

    fn get_latest(&self) -> Result<Option<CachedRecord>, CacheError> {
        self.inner.get_latest()
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear()
    }

    fn list(&self) -> Result<Vec<CacheEntrySummary>, CacheError> {
        self.inner.list()
    }

    fn readiness(&self) -> Result<(), CacheError> {
        self.inner.readiness()
    }
}

// ============================================================================
// SECTION: Remote Profile Store
// ============================================================================

/// Remote profile store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Backend could not be reached.
    #[error("remote profile store unavailable: {0}")]
    Unavailable(String),
    /// Backend refused the update.
    #[error("remote profile store rejected update: {0}")]
    Rejected(String),
}

/// Remote key-value profile endpoint keyed by user id.
#[async_trait]
pub trait RemoteProfileStore {
    /// Upserts profile fields for a user.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the backend is unreachable or refuses the
    /// update.
    async fn upsert_remote(&self, id: &UserId, fields: &Attributes) -> Result<(), RemoteError>;
}
