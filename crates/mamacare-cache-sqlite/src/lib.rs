// crates/mamacare-cache-sqlite/src/lib.rs
// ============================================================================
// Module: MamaCare Cache SQLite
// Description: SQLite-backed offline profile cache.
// Purpose: Persist one profile record per user across app restarts.
// Dependencies: mamacare-cache-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteProfileCache`] implements
//! [`mamacare_cache_core::ProfileCacheStore`] over a lazily opened `SQLite`
//! file named [`STORE_FILE_NAME`]. Connection management lives in
//! [`StorageHandle`]; the store layers the merge rule and codec on top.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod handle;
mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use handle::DEFAULT_BUSY_TIMEOUT_MS;
pub use handle::SCHEMA_VERSION;
pub use handle::STORE_FILE_NAME;
pub use handle::SqliteCacheConfig;
pub use handle::SqliteCacheError;
pub use handle::SqliteJournalMode;
pub use handle::SqliteSyncMode;
pub use handle::StorageHandle;
pub use store::SqliteProfileCache;
