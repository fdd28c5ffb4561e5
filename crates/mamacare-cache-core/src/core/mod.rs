// crates/mamacare-cache-core/src/core/mod.rs
// ============================================================================
// Module: Cache Core Model
// Description: Identifiers, timestamps, records, and the record codec.
// Purpose: Group the data model shared by every cache backend.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core data model for the offline profile cache. Backends persist these
//! types; session code only ever sees copies of them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod identifiers;
pub mod record;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::MAX_USER_ID_BYTES;
pub use identifiers::UserId;
pub use record::Attributes;
pub use record::CacheEntrySummary;
pub use record::CacheWrite;
pub use record::CachedRecord;
pub use record::WriteMode;
pub use time::Timestamp;
