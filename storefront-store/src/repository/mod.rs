//! Repository Module
//!
//! Typed CRUD over the store, one key per collection:
//!
//! | Key | Shape |
//! |-----|-------|
//! | `categories` | `[Category]` |
//! | `dishes` | `[Dish]` |
//! | `orders` | `[Order]`, newest first |
//! | `cart_settings_<restaurantId>` | `CartSettings` |
//! | `restaurant_settings` | `RestaurantSettings` |
//!
//! Every mutation reads the collection with its revision, changes it in
//! memory and writes the whole collection back with that revision. If
//! another tab wrote in between the write fails with [`RepoError::Conflict`]
//! and nothing is stored.

// Menu
pub mod category;
pub mod dish;

// Orders
pub mod contact;
pub mod order;

// Settings
pub mod cart_settings;
pub mod restaurant_settings;

// Re-exports
pub use cart_settings::CartSettingsRepository;
pub use category::CategoryRepository;
pub use contact::ContactRepository;
pub use dish::DishRepository;
pub use order::OrderRepository;
pub use restaurant_settings::RestaurantSettingsRepository;

use crate::bus::EventBus;
use crate::storage::{KvStore, StorageError, schema};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::event::StoreEvent;
use shared::models::FieldError;
use shared::order::OrderStatus;
use thiserror::Error;

pub const CATEGORIES_KEY: &str = "categories";
pub const DISHES_KEY: &str = "dishes";
pub const ORDERS_KEY: &str = "orders";
pub const RESTAURANT_SETTINGS_KEY: &str = "restaurant_settings";

/// Key of one restaurant's cart settings
pub fn cart_settings_key(restaurant_id: &str) -> String {
    format!("cart_settings_{restaurant_id}")
}

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Id already exists: {id}")]
    AlreadyExists { id: String },

    #[error("Cannot delete {entity} {id}: {dependents} {dependent_kind} still reference it")]
    ReferentialIntegrity {
        entity: &'static str,
        id: String,
        dependent_kind: &'static str,
        dependents: usize,
    },

    #[error("Order {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Write conflict on '{key}': expected revision {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error(transparent)]
    Storage(StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepoError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RepoError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict {
                key,
                expected,
                actual,
            } => RepoError::Conflict {
                key,
                expected,
                actual,
            },
            StorageError::Serialization(e) => RepoError::Serialization(e),
            other => RepoError::Storage(other),
        }
    }
}

impl From<FieldError> for RepoError {
    fn from(err: FieldError) -> Self {
        RepoError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::Validation { field, .. } => {
                let code = match field.as_str() {
                    "items" => ErrorCode::OrderEmpty,
                    "price" => ErrorCode::DishInvalidPrice,
                    _ => ErrorCode::ValidationFailed,
                };
                AppError::with_message(code, message).with_detail("field", field)
            }
            RepoError::AlreadyExists { id } => {
                AppError::with_message(ErrorCode::AlreadyExists, message).with_detail("id", id)
            }
            RepoError::NotFound { entity, id } => {
                let code = match entity {
                    "category" => ErrorCode::CategoryNotFound,
                    "dish" => ErrorCode::DishNotFound,
                    "order" => ErrorCode::OrderNotFound,
                    "delivery_zone" => ErrorCode::DeliveryZoneNotFound,
                    "cart_settings" => ErrorCode::CartSettingsNotFound,
                    _ => ErrorCode::NotFound,
                };
                AppError::with_message(code, message).with_detail("id", id)
            }
            RepoError::ReferentialIntegrity { id, dependents, .. } => {
                AppError::with_message(ErrorCode::CategoryHasDishes, message)
                    .with_detail("id", id)
                    .with_detail("dependents", dependents)
            }
            RepoError::InvalidTransition { id, from, to } => {
                let code = match from {
                    OrderStatus::Completed => ErrorCode::OrderAlreadyCompleted,
                    OrderStatus::Cancelled => ErrorCode::OrderAlreadyCancelled,
                    _ => ErrorCode::OrderInvalidTransition,
                };
                AppError::with_message(code, message)
                    .with_detail("id", id)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            RepoError::Conflict { key, .. } => {
                AppError::with_message(ErrorCode::WriteConflict, message).with_detail("key", key)
            }
            RepoError::Storage(StorageError::UnsupportedSchema { key, .. }) => {
                AppError::with_message(ErrorCode::UnsupportedSchema, message)
                    .with_detail("key", key)
            }
            RepoError::Storage(
                StorageError::Storage(redb::StorageError::Io(_)) | StorageError::Io(_),
            ) => {
                AppError::with_message(ErrorCode::StorageFull, message)
            }
            RepoError::Storage(_) => AppError::database(message),
            RepoError::Serialization(_) => {
                AppError::with_message(ErrorCode::StorageCorrupted, message)
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// A collection together with the revision it was read at
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: T,
    pub revision: u64,
}

/// Shared plumbing: store handle, event bus, seeding switch
#[derive(Debug, Clone)]
pub struct BaseRepository {
    kv: KvStore,
    bus: EventBus,
    seed_defaults: bool,
}

impl BaseRepository {
    pub fn new(kv: KvStore, bus: EventBus, seed_defaults: bool) -> Self {
        Self {
            kv,
            bus,
            seed_defaults,
        }
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn seed_defaults(&self) -> bool {
        self.seed_defaults
    }

    /// Read and decode a collection; `None` when the key is absent
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<Snapshot<T>>> {
        let (raw, revision) = self.kv.read_raw(key)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let stored = schema::unwrap(key, &raw)?;
        let data = serde_json::from_value(stored.data).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Stored collection is corrupt");
            e
        })?;
        Ok(Some(Snapshot { data, revision }))
    }

    /// Read a collection, writing `seed()` first if the key is absent
    ///
    /// Seeding emits no events. If another tab seeds the same key first, its
    /// value is used.
    pub fn load_or_seed<T, F>(&self, key: &str, seed: F) -> RepoResult<Snapshot<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(snapshot) = self.load(key)? {
            return Ok(snapshot);
        }

        let revision = self.kv.revision(key)?;
        let data = seed();
        match self.save(key, &data, revision) {
            Ok(revision) => {
                tracing::info!(key = %key, "Seeded collection");
                Ok(Snapshot { data, revision })
            }
            Err(RepoError::Conflict { .. }) => self
                .load(key)?
                .ok_or_else(|| RepoError::not_found("collection", key)),
            Err(e) => Err(e),
        }
    }

    /// Write a whole collection, checking the revision it was read at
    pub fn save<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        expected_revision: u64,
    ) -> RepoResult<u64> {
        let raw = schema::wrap(data)?;
        let revision = self.kv.write_raw(key, &raw, Some(expected_revision))?;
        Ok(revision)
    }

    /// Rewrite a legacy (pre-envelope) value in the current envelope
    ///
    /// Returns whether anything was rewritten.
    pub fn upgrade(&self, key: &str) -> RepoResult<bool> {
        let (raw, revision) = self.kv.read_raw(key)?;
        let Some(raw) = raw else {
            return Ok(false);
        };
        if schema::stored_version(&raw) == Some(schema::SCHEMA_VERSION) {
            return Ok(false);
        }
        let stored = schema::unwrap(key, &raw)?;
        self.save(key, &stored.data, revision)?;
        tracing::info!(key = %key, "Upgraded stored collection to current schema");
        Ok(true)
    }

    /// Publish on the event bus
    pub fn emit(&self, event: StoreEvent) {
        self.bus.emit(event);
    }
}

/// Pick the id for a new record
///
/// A caller-supplied id must be non-blank and unused.
pub(crate) fn resolve_id(
    requested: Option<String>,
    exists: impl Fn(&str) -> bool,
) -> RepoResult<String> {
    match requested {
        Some(id) if id.trim().is_empty() => {
            Err(RepoError::validation("id", "id must not be blank"))
        }
        Some(id) if exists(&id) => Err(RepoError::AlreadyExists { id }),
        Some(id) => Ok(id),
        None => loop {
            let id = shared::util::generate_id();
            if !exists(&id) {
                break Ok(id);
            }
        },
    }
}

/// Merge the set fields of `patch` over `record`
///
/// Objects merge recursively, everything else is replaced. Fields named in
/// `preserve` keep their stored values whatever the patch says, and
/// `updatedAt` is refreshed. A patch that leaves the record undecodable is a
/// [`RepoError::Validation`] on `patch`.
pub(crate) fn merge_patch<T, P>(record: &T, patch: &P, preserve: &[&str]) -> RepoResult<T>
where
    T: Serialize + DeserializeOwned,
    P: Serialize,
{
    let original = serde_json::to_value(record)?;
    let mut merged = original.clone();
    merge_values(&mut merged, serde_json::to_value(patch)?);

    if let (Value::Object(merged), Value::Object(original)) = (&mut merged, &original) {
        for field in preserve {
            match original.get(*field) {
                Some(value) => {
                    merged.insert((*field).to_string(), value.clone());
                }
                None => {
                    merged.remove(*field);
                }
            }
        }
        merged.insert(
            "updatedAt".to_string(),
            Value::String(shared::util::now_iso()),
        );
    }

    // The stored record decoded fine, so a failure here comes from the patch
    serde_json::from_value(merged).map_err(|e| RepoError::validation("patch", e.to_string()))
}

fn merge_values(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_object()
                    && let Some(existing) = target.get_mut(&key).filter(|v| v.is_object())
                {
                    merge_values(existing, value);
                    continue;
                }
                target.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SyncChannel;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Record {
        id: String,
        name: String,
        nested: Nested,
        created_at: String,
        updated_at: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Nested {
        a: bool,
        b: bool,
    }

    fn record() -> Record {
        Record {
            id: "r1".to_string(),
            name: "old".to_string(),
            nested: Nested { a: true, b: true },
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn base() -> BaseRepository {
        let kv = KvStore::open_in_memory(SyncChannel::new()).unwrap();
        BaseRepository::new(kv, EventBus::new(), true)
    }

    #[test]
    fn test_merge_patch_preserves_identity() {
        let patch = json!({
            "id": "hijack",
            "createdAt": "1999",
            "name": "new",
            "nested": {"b": false}
        });
        let merged: Record = merge_patch(&record(), &patch, &["id", "createdAt"]).unwrap();

        assert_eq!(merged.id, "r1");
        assert_eq!(merged.created_at, "2026-01-01T00:00:00.000Z");
        assert_eq!(merged.name, "new");
        assert_eq!(merged.nested, Nested { a: true, b: false });
        assert_ne!(merged.updated_at, "2026-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_merge_patch_rejects_wrong_types() {
        let patch = json!({"name": 5});
        let result: RepoResult<Record> = merge_patch(&record(), &patch, &["id"]);
        assert!(matches!(
            result,
            Err(RepoError::Validation { ref field, .. }) if field == "patch"
        ));
    }

    #[test]
    fn test_resolve_id() {
        let taken = |id: &str| id == "c1";
        assert_eq!(resolve_id(Some("c2".to_string()), taken).unwrap(), "c2");
        assert!(matches!(
            resolve_id(Some("c1".to_string()), taken),
            Err(RepoError::AlreadyExists { ref id }) if id == "c1"
        ));
        assert!(matches!(
            resolve_id(Some(" ".to_string()), taken),
            Err(RepoError::Validation { ref field, .. }) if field == "id"
        ));
        assert!(!resolve_id(None, taken).unwrap().is_empty());
    }

    #[test]
    fn test_load_or_seed_writes_once() {
        let base = base();
        let first: Snapshot<Vec<u32>> = base.load_or_seed("numbers", || vec![1, 2]).unwrap();
        assert_eq!(first.data, vec![1, 2]);
        assert_eq!(first.revision, 1);

        let second: Snapshot<Vec<u32>> = base.load_or_seed("numbers", || vec![9]).unwrap();
        assert_eq!(second.data, vec![1, 2]);
        assert_eq!(second.revision, 1);
    }

    #[test]
    fn test_save_with_stale_revision() {
        let base = base();
        base.save("numbers", &vec![1u32], 0).unwrap();
        let err = base.save("numbers", &vec![2u32], 0).unwrap_err();
        assert!(matches!(err, RepoError::Conflict { expected: 0, actual: 1, .. }));
    }

    #[test]
    fn test_corrupt_collection_is_an_error() {
        let base = base();
        base.kv().write_raw("numbers", r#"{"schemaVersion":1,"data":"x"}"#, None).unwrap();
        assert!(matches!(
            base.load::<Vec<u32>>("numbers"),
            Err(RepoError::Serialization(_))
        ));
    }

    #[test]
    fn test_upgrade_legacy_value() {
        let base = base();
        base.kv().write_raw("numbers", "[1,2,3]", None).unwrap();
        assert!(base.upgrade("numbers").unwrap());
        assert!(!base.upgrade("numbers").unwrap());

        let raw = base.kv().read_raw("numbers").unwrap().0.unwrap();
        assert_eq!(raw, r#"{"data":[1,2,3],"schemaVersion":1}"#);
        let loaded: Snapshot<Vec<u32>> = base.load("numbers").unwrap().unwrap();
        assert_eq!(loaded.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = RepoError::not_found("dish", "d1").into();
        assert_eq!(err.code, ErrorCode::DishNotFound);

        let err: AppError = RepoError::InvalidTransition {
            id: "o1".to_string(),
            from: OrderStatus::Completed,
            to: OrderStatus::Cancelled,
        }
        .into();
        assert_eq!(err.code, ErrorCode::OrderAlreadyCompleted);

        let err: AppError = RepoError::validation("name.primary", "required").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(
            err.details.unwrap().get("field"),
            Some(&json!("name.primary"))
        );

        let err: AppError = RepoError::validation("items", "empty").into();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
        let err: AppError = RepoError::validation("price", "negative").into();
        assert_eq!(err.code, ErrorCode::DishInvalidPrice);
        let err: AppError = RepoError::validation("deliveryZone.price", "negative").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err: AppError = RepoError::AlreadyExists { id: "c1".to_string() }.into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(err.details.unwrap().get("id"), Some(&json!("c1")));

        let err: AppError = RepoError::validation("patch", "invalid type").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
