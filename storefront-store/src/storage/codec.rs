//! Value <-> stored text
//!
//! Values are stored as JSON text, except values that serialize to a JSON
//! string: those are stored bare so plain strings written by older builds
//! read back unchanged.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serialize a value into its stored text form
pub fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => serde_json::to_string(&other),
    }
}

/// Best-effort decode of stored text
///
/// Tries JSON first, then the raw text taken as a JSON string. Returns
/// `None` when neither yields a `T`.
pub fn decode_lenient<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str::<T>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                key = %key,
                error = %e,
                "Stored value is not valid JSON for this type, retrying as raw text"
            );
            match serde_json::from_value::<T>(Value::String(raw.to_string())) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Stored value could not be decoded");
                    None
                }
            }
        }
    }
}
