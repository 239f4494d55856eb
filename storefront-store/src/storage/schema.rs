//! Versioned collection envelope
//!
//! ```json
//! {"schemaVersion": 1, "data": [...]}
//! ```
//!
//! Values written before the envelope existed are bare arrays/objects and
//! read as version 0.

use super::error::{StorageError, StorageResult};
use serde::Serialize;
use serde_json::{Value, json};

/// Envelope version written by this build
pub const SCHEMA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";
const DATA_FIELD: &str = "data";

/// Collection payload with the version it was stored under
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub version: u32,
    pub data: Value,
}

impl Versioned {
    pub fn is_current(&self) -> bool {
        self.version == SCHEMA_VERSION
    }
}

/// Wrap a collection in the current envelope
pub fn wrap<T: Serialize + ?Sized>(data: &T) -> StorageResult<String> {
    let value = json!({
        VERSION_FIELD: SCHEMA_VERSION,
        DATA_FIELD: serde_json::to_value(data)?,
    });
    Ok(serde_json::to_string(&value)?)
}

/// Parse stored text into a versioned payload, migrated to the current version
pub fn unwrap(key: &str, raw: &str) -> StorageResult<Versioned> {
    let value: Value = serde_json::from_str(raw)?;
    let stored = split_envelope(value);

    if stored.version > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            key: key.to_string(),
            found: stored.version,
            supported: SCHEMA_VERSION,
        });
    }

    Ok(migrate(key, stored))
}

/// Version a stored value was written under; `None` if it is not JSON
pub fn stored_version(raw: &str) -> Option<u32> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .map(|value| split_envelope(value).version)
}

fn split_envelope(value: Value) -> Versioned {
    match value {
        Value::Object(mut map)
            if map.len() == 2
                && map.contains_key(DATA_FIELD)
                && map.get(VERSION_FIELD).is_some_and(Value::is_u64) =>
        {
            let version = map
                .get(VERSION_FIELD)
                .and_then(Value::as_u64)
                .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
                .unwrap_or_default();
            let data = map.remove(DATA_FIELD).unwrap_or(Value::Null);
            Versioned { version, data }
        }
        bare => Versioned {
            version: 0,
            data: bare,
        },
    }
}

/// Run every migration step between the stored and the current version
fn migrate(key: &str, mut stored: Versioned) -> Versioned {
    while stored.version < SCHEMA_VERSION {
        stored = match stored.version {
            0 => upgrade_v0(key, stored.data),
            v => {
                tracing::warn!(
                    key = %key,
                    version = v,
                    "No migration step registered, assuming compatible layout"
                );
                Versioned {
                    version: v + 1,
                    data: stored.data,
                }
            }
        };
    }
    stored
}

/// v0 → v1: bare value into the envelope
///
/// Record shapes are unchanged; fields added later carry serde defaults.
/// Legacy nulls where a collection is expected become empty collections.
fn upgrade_v0(key: &str, data: Value) -> Versioned {
    tracing::info!(key = %key, "Migrating legacy collection to schema v1");
    let data = match data {
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    Versioned { version: 1, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_then_unwrap() {
        let raw = wrap(&vec![1, 2, 3]).unwrap();
        assert_eq!(raw, r#"{"data":[1,2,3],"schemaVersion":1}"#);

        let stored = unwrap("k", &raw).unwrap();
        assert!(stored.is_current());
        assert_eq!(stored.data, json!([1, 2, 3]));
    }

    #[test]
    fn test_legacy_bare_array_migrates() {
        let stored = unwrap("categories", r#"[{"id":"c1"}]"#).unwrap();
        assert_eq!(stored.version, SCHEMA_VERSION);
        assert_eq!(stored.data, json!([{"id": "c1"}]));
    }

    #[test]
    fn test_legacy_object_with_data_field_is_not_an_envelope() {
        let stored = unwrap("k", r#"{"data": 1, "name": "x"}"#).unwrap();
        assert_eq!(stored.data, json!({"data": 1, "name": "x"}));
    }

    #[test]
    fn test_stored_version() {
        assert_eq!(stored_version(r#"{"schemaVersion":1,"data":[]}"#), Some(1));
        assert_eq!(stored_version("[]"), Some(0));
        assert_eq!(stored_version("not json"), None);
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = unwrap("orders", r#"{"schemaVersion": 9, "data": []}"#).unwrap_err();
        assert!(matches!(
            err,
            StorageError::UnsupportedSchema {
                found: 9,
                supported: SCHEMA_VERSION,
                ..
            }
        ));
    }

    #[test]
    fn test_corrupt_value() {
        assert!(matches!(
            unwrap("orders", "[{broken"),
            Err(StorageError::Serialization(_))
        ));
    }
}
