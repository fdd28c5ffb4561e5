// crates/mamacare-cache-core/src/core/codec.rs
// ============================================================================
// Module: Record Codec
// Description: Text encoding for cached profile and session attributes.
// Purpose: Convert attribute bags to and from their stored column form.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Attribute bags are stored as compact JSON text. Encoding cannot fail for
//! an [`Attributes`] value; decoding treats the stored text as untrusted and
//! reports anything that is not a JSON object as malformed. Error messages
//! name the column but never echo payload contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::UserId;
use crate::core::record::Attributes;
use crate::core::record::CacheWrite;
use crate::interfaces::CacheError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum encoded size of a single attribute payload.
pub const MAX_ATTRIBUTES_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Stored payload column, used to label codec failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadColumn {
    /// Profile attributes column.
    ProfileData,
    /// Session attributes column.
    UserData,
}

impl PayloadColumn {
    /// Returns the persisted column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProfileData => "profileData",
            Self::UserData => "userData",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record codec errors.
///
/// # Invariants
/// - Messages never include the encoded payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stored text is not an encoded attribute object.
    #[error("malformed {name} payload: {reason}", name = .column.as_str())]
    Malformed {
        /// Column that failed to decode.
        column: PayloadColumn,
        /// Decoder failure description.
        reason: String,
    },
    /// Serializer rejected an attribute value.
    #[error("failed to encode {name} payload: {reason}", name = .column.as_str())]
    Encode {
        /// Column being encoded.
        column: PayloadColumn,
        /// Serializer failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Encodes attributes as compact JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] only if the serializer fails, which does
/// not happen for string-keyed JSON objects.
pub fn encode(value: &Attributes, column: PayloadColumn) -> Result<String, CodecError> {
    serde_json::to_string(value.as_map()).map_err(|err| CodecError::Encode {
        column,
        reason: err.to_string(),
    })
}

/// Decodes stored text into attributes.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when the text is not valid JSON or is
/// not a JSON object.
pub fn decode(text: &str, column: PayloadColumn) -> Result<Attributes, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(|err| CodecError::Malformed {
        column,
        reason: err.to_string(),
    })?;
    Attributes::from_value(value).ok_or_else(|| CodecError::Malformed {
        column,
        reason: "expected a JSON object".to_string(),
    })
}

/// Decodes an optional stored column; absent input stays absent.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] when present text fails [`decode`].
pub fn decode_optional(
    text: Option<&str>,
    column: PayloadColumn,
) -> Result<Option<Attributes>, CodecError> {
    text.map(|text| decode(text, column)).transpose()
}

// ============================================================================
// SECTION: Prepared Writes
// ============================================================================

/// Upsert payload after validation and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWrite {
    /// Validated user identifier.
    pub id: UserId,
    /// Encoded profile attributes.
    pub profile_data: String,
    /// Encoded session attributes, absent for profile-only writes.
    pub user_data: Option<String>,
}

/// Validates a write and encodes its payloads.
///
/// # Errors
///
/// Returns [`CacheError::Invalid`] for an unusable id or a payload over
/// [`MAX_ATTRIBUTES_BYTES`], and [`CacheError::Write`] if encoding fails.
pub fn encode_write(write: &CacheWrite) -> Result<EncodedWrite, CacheError> {
    write.id.validate().map_err(|reason| CacheError::Invalid(reason.to_string()))?;
    let profile_data = encode(&write.profile_data, PayloadColumn::ProfileData)?;
    ensure_within_limit(&profile_data, PayloadColumn::ProfileData)?;
    let user_data = match &write.user_data {
        Some(user_data) => {
            let encoded = encode(user_data, PayloadColumn::UserData)?;
            ensure_within_limit(&encoded, PayloadColumn::UserData)?;
            Some(encoded)
        }
        None => None,
    };
    Ok(EncodedWrite {
        id: write.id.clone(),
        profile_data,
        user_data,
    })
}

/// Rejects encoded payloads over the size limit.
fn ensure_within_limit(encoded: &str, column: PayloadColumn) -> Result<(), CacheError> {
    if encoded.len() > MAX_ATTRIBUTES_BYTES {
        return Err(CacheError::Invalid(format!(
            "{} payload exceeds size limit: {} bytes (max {MAX_ATTRIBUTES_BYTES})",
            column.as_str(),
            encoded.len()
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
