// crates/mamacare-cache-core/src/core/identifiers.rs
// ============================================================================
// Module: Cache Identifiers
// Description: Opaque user identifiers keying cached profile records.
// Purpose: Provide a strongly typed, serializable key with a stable wire form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Cached records are keyed by the user identifier issued by the
//! authentication provider. The identifier is opaque: the cache never parses
//! it, it only checks the bounds that keep it usable as a primary key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted user identifier length in bytes.
pub const MAX_USER_ID_BYTES: usize = 256;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// User identifier that keys a cached record.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
/// - [`UserId::validate`] must pass before the identifier reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that the identifier is usable as a storage key.
    ///
    /// # Errors
    ///
    /// Returns a static reason when the identifier is empty or longer than
    /// [`MAX_USER_ID_BYTES`].
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.0.is_empty() {
            return Err("user id must not be empty");
        }
        if self.0.len() > MAX_USER_ID_BYTES {
            return Err("user id exceeds length limit");
        }
        Ok(())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
