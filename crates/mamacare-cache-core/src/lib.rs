// crates/mamacare-cache-core/src/lib.rs
// ============================================================================
// Module: MamaCare Cache Core
// Description: Offline profile cache model, merge policy, and interfaces.
// Purpose: Keep a last-known-good profile available when the backend is not.
// Dependencies: async-trait, serde, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! The offline profile cache stores exactly one evolving record per user so
//! the client can render a profile while the backend is unreachable. This
//! crate owns the record model, the [`core::codec`] text encoding, the pure
//! [`runtime::merge_write`] policy, and the [`ProfileCacheStore`] contract.
//! Storage engines live in sibling crates.
//!
//! Callers normally go through [`OfflineProfileCache`], which never lets a
//! cache failure escape: writes degrade to no-ops and reads to "nothing
//! cached".

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::Attributes;
pub use crate::core::CacheEntrySummary;
pub use crate::core::CacheWrite;
pub use crate::core::CachedRecord;
pub use crate::core::MAX_USER_ID_BYTES;
pub use crate::core::Timestamp;
pub use crate::core::UserId;
pub use crate::core::WriteMode;
pub use crate::core::codec::CodecError;
pub use crate::core::codec::EncodedWrite;
pub use crate::core::codec::MAX_ATTRIBUTES_BYTES;
pub use crate::core::codec::PayloadColumn;
pub use interfaces::CacheError;
pub use interfaces::ProfileCacheStore;
pub use interfaces::RemoteError;
pub use interfaces::RemoteProfileStore;
pub use interfaces::SharedProfileCacheStore;
pub use runtime::ExistingRow;
pub use runtime::InMemoryProfileCache;
pub use runtime::MergeAction;
pub use runtime::MergedRow;
pub use runtime::OfflineProfileCache;
pub use runtime::ProfileSync;
pub use runtime::SyncError;
pub use runtime::merge_write;
