// crates/mamacare-cache-core/src/runtime/merge.rs
// ============================================================================
// Module: Write Merge Policy
// Description: Pure read-merge-write rule for cache upserts.
// Purpose: Keep stored session data alive across profile-only writes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every upsert reads the existing row (if any), computes the merged row with
//! [`merge_write`], and writes the result. The rule is independent of the
//! storage engine and generic over payload representation: the in-memory
//! store merges decoded [`crate::Attributes`], the `SQLite` store merges
//! encoded text so stored session data is carried over without decoding it.
//!
//! Invariants:
//! - Only a write that carries session data changes stored session data.
//! - `updated_at` never decreases for an id, even if the wall clock does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Timestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fields of the stored row that the merge rule reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRow<U> {
    /// Stored session payload.
    pub user_data: Option<U>,
    /// Stored write timestamp.
    pub updated_at: Timestamp,
}

/// Storage action implied by a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// No row existed; insert one.
    Insert,
    /// Full write over an existing row; replace it wholesale.
    Replace,
    /// Profile-only write over an existing row; keep its session payload.
    UpdateProfile,
}

impl MergeAction {
    /// Returns a stable label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Replace => "replace",
            Self::UpdateProfile => "update_profile",
        }
    }
}

/// Row contents to persist after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow<P, U> {
    /// Profile payload to store.
    pub profile_data: P,
    /// Session payload to store.
    pub user_data: Option<U>,
    /// Write timestamp to store.
    pub updated_at: Timestamp,
    /// Storage action to perform.
    pub action: MergeAction,
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges an incoming write with the stored row for the same id.
#[must_use]
pub fn merge_write<P, U>(
    existing: Option<ExistingRow<U>>,
    profile_data: P,
    user_data: Option<U>,
    now: Timestamp,
) -> MergedRow<P, U> {
    let Some(existing) = existing else {
        return MergedRow {
            profile_data,
            user_data,
            updated_at: now,
            action: MergeAction::Insert,
        };
    };
    let updated_at = now.max(existing.updated_at);
    match user_data {
        Some(user_data) => MergedRow {
            profile_data,
            user_data: Some(user_data),
            updated_at,
            action: MergeAction::Replace,
        },
        None => MergedRow {
            profile_data,
            user_data: existing.user_data,
            updated_at,
            action: MergeAction::UpdateProfile,
        },
    }
}
