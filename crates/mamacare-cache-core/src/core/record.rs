// crates/mamacare-cache-core/src/core/record.rs
// ============================================================================
// Module: Cached Record Model
// Description: The single cached entity plus the write request shapes.
// Purpose: Give profile and session attributes an explicit serializable type.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`CachedRecord`] holds the last-known profile attributes for one user,
//! plus the session attributes from the most recent full refresh. Writes are
//! described by [`CacheWrite`]; whether a write carries session attributes
//! decides its [`WriteMode`].
//!
//! Invariants:
//! - Callers receive copies; the store owns the persisted rows.
//! - `updated_at` is assigned by the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Attributes
// ============================================================================

/// Structured attribute bag for profile or session data.
///
/// # Invariants
/// - Always a JSON object at the top level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Creates an empty attribute bag.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Converts a JSON value into attributes when it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Inserts an attribute, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style variant of [`Attributes::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns an attribute value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Cached profile record for one user.
///
/// # Invariants
/// - At most one record exists per `id`.
/// - `user_data` is only replaced by a full write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRecord {
    /// User identifier (primary key).
    pub id: UserId,
    /// Profile attributes from the latest write.
    pub profile_data: Attributes,
    /// Session attributes from the latest full write, if any.
    pub user_data: Option<Attributes>,
    /// Time of the latest write.
    pub updated_at: Timestamp,
}

/// Listing entry describing a cached record without its payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntrySummary {
    /// User identifier.
    pub id: UserId,
    /// Time of the latest write.
    pub updated_at: Timestamp,
    /// Whether session attributes are cached.
    pub has_user_data: bool,
    /// Encoded profile payload length in bytes.
    pub profile_bytes: usize,
    /// Encoded session payload length in bytes (zero when absent).
    pub user_bytes: usize,
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// How a write treats previously cached session attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replaces the whole row, session attributes included.
    Full,
    /// Replaces profile attributes and keeps stored session attributes.
    ProfileOnly,
}

impl WriteMode {
    /// Returns a stable label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::ProfileOnly => "profile_only",
        }
    }
}

/// Upsert request for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWrite {
    /// Target user identifier.
    pub id: UserId,
    /// Profile attributes to store.
    pub profile_data: Attributes,
    /// Session attributes; `None` makes this a profile-only write.
    pub user_data: Option<Attributes>,
}

impl CacheWrite {
    /// Builds a write from the upsert argument triple.
    #[must_use]
    pub const fn new(id: UserId, profile_data: Attributes, user_data: Option<Attributes>) -> Self {
        Self {
            id,
            profile_data,
            user_data,
        }
    }

    /// Builds a full write that replaces session attributes.
    #[must_use]
    pub const fn full(id: UserId, profile_data: Attributes, user_data: Attributes) -> Self {
        Self::new(id, profile_data, Some(user_data))
    }

    /// Builds a profile-only write.
    #[must_use]
    pub const fn profile_only(id: UserId, profile_data: Attributes) -> Self {
        Self::new(id, profile_data, None)
    }

    /// Classifies the write.
    #[must_use]
    pub const fn mode(&self) -> WriteMode {
        if self.user_data.is_some() { WriteMode::Full } else { WriteMode::ProfileOnly }
    }
}
