// crates/mamacare-cache-core/src/runtime/mod.rs
// ============================================================================
// Module: Cache Runtime
// Description: Merge policy, in-memory store, async boundary, write-through.
// Purpose: Behavior shared by every cache backend and its callers.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime pieces layered over the interfaces: the pure merge rule, an
//! in-memory backend, the non-fatal async boundary, and the session
//! write-through coordinator.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod boundary;
pub mod memory;
pub mod merge;
pub mod sync;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use boundary::OfflineProfileCache;
pub use memory::InMemoryProfileCache;
pub use merge::ExistingRow;
pub use merge::MergeAction;
pub use merge::MergedRow;
pub use merge::merge_write;
pub use sync::ProfileSync;
pub use sync::SyncError;
