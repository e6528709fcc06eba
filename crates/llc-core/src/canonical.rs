//! # Canonical JSON Output
//!
//! Responses relayed from the register store are re-serialized with
//! RFC 8785 (JCS) ordering so that the same record always produces the same
//! bytes, whatever key order the backend chose.

use serde_json::Value;

use crate::error::CanonicalizationError;

/// Serialize `value` with sorted keys and compact separators.
pub fn to_canonical_string(value: &Value) -> Result<String, CanonicalizationError> {
    Ok(serde_jcs::to_string(value)?)
}
