//! redb-backed key/value store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `items` | key | raw text | Stored values |
//! | `revisions` | key | `u64` | Write counter per key, survives deletes |
//!
//! Two access paths share the tables:
//!
//! - best-effort (`get_item`, `set_item`, `remove_item`): never fail, log instead
//! - fallible (`read_raw`, `write_raw`, `delete_raw`, ...): every error is returned,
//!   writes may carry the revision the caller read for an optimistic check

use super::codec;
use super::error::{StorageError, StorageResult};
use super::sync::{ChangeReceiver, StorageChange, Subscription, SyncChannel};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Table for stored values: key = storage key, value = raw text
const ITEMS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("items");

/// Table for write counters: key = storage key, value = revision
const REVISIONS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("revisions");

/// Prefix of the marker keys older builds wrote to wake other tabs
const LEGACY_SYNC_PREFIX: &str = "__sync_";

/// One tab's handle on the shared store
///
/// Cloning keeps the same origin; use [`KvStore::new_tab`] for a sibling tab.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
    sync: SyncChannel,
    origin: String,
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl KvStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>, sync: SyncChannel) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, sync)
    }

    /// Open an in-memory database (tests, ephemeral sessions)
    pub fn open_in_memory(sync: SyncChannel) -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, sync)
    }

    fn init(db: Database, sync: SyncChannel) -> StorageResult<Self> {
        // Create tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ITEMS_TABLE)?;
            let _ = write_txn.open_table(REVISIONS_TABLE)?;
        }
        write_txn.commit()?;

        let store = Self {
            db: Arc::new(db),
            sync,
            origin: new_origin(),
        };
        tracing::debug!(origin = %store.origin, "Key/value store opened");
        Ok(store)
    }

    /// Sibling tab: same database and channel, new origin
    pub fn new_tab(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            sync: self.sync.clone(),
            origin: new_origin(),
        }
    }

    /// This tab's origin id
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn sync_channel(&self) -> &SyncChannel {
        &self.sync
    }

    // ========== Fallible API ==========

    /// Raw text and current revision of `key`
    ///
    /// A key that was never written has revision 0.
    pub fn read_raw(&self, key: &str) -> StorageResult<(Option<String>, u64)> {
        let read_txn = self.db.begin_read()?;
        let items = read_txn.open_table(ITEMS_TABLE)?;
        let revisions = read_txn.open_table(REVISIONS_TABLE)?;
        let raw = items.get(key)?.map(|guard| guard.value().to_string());
        let revision = revisions.get(key)?.map(|guard| guard.value()).unwrap_or(0);
        Ok((raw, revision))
    }

    /// Current revision of `key`
    pub fn revision(&self, key: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let revisions = read_txn.open_table(REVISIONS_TABLE)?;
        Ok(revisions.get(key)?.map(|guard| guard.value()).unwrap_or(0))
    }

    /// Write raw text, returning the new revision
    ///
    /// With `expected_revision`, the write only happens if the stored
    /// revision still matches; otherwise [`StorageError::Conflict`].
    pub fn write_raw(
        &self,
        key: &str,
        raw: &str,
        expected_revision: Option<u64>,
    ) -> StorageResult<u64> {
        let (_, revision) = self.commit_change(key, Some(raw), expected_revision)?;
        Ok(revision)
    }

    /// Remove `key`; returns whether it existed
    ///
    /// Removing an absent key changes nothing and notifies nobody.
    pub fn delete_raw(&self, key: &str, expected_revision: Option<u64>) -> StorageResult<bool> {
        let (removed, _) = self.commit_change(key, None, expected_revision)?;
        Ok(removed)
    }

    /// Serialize and write without a revision check
    pub fn try_set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<u64> {
        let raw = codec::encode(value)?;
        self.write_raw(key, &raw, None)
    }

    /// All stored keys (legacy sync markers excluded)
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let items = read_txn.open_table(ITEMS_TABLE)?;

        let mut keys = Vec::new();
        for result in items.iter()? {
            let (key, _value) = result?;
            let key = key.value();
            if !key.starts_with(LEGACY_SYNC_PREFIX) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    pub fn contains_key(&self, key: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let items = read_txn.open_table(ITEMS_TABLE)?;
        Ok(items.get(key)?.is_some())
    }

    /// Apply one change in its own write transaction
    ///
    /// Returns whether anything was committed and the resulting revision. A
    /// delete of an absent key is decided inside the transaction and aborts.
    fn commit_change(
        &self,
        key: &str,
        new_value: Option<&str>,
        expected_revision: Option<u64>,
    ) -> StorageResult<(bool, u64)> {
        let write_txn = self.db.begin_write()?;
        let change = {
            let mut items = write_txn.open_table(ITEMS_TABLE)?;
            let mut revisions = write_txn.open_table(REVISIONS_TABLE)?;

            let current = revisions.get(key)?.map(|guard| guard.value()).unwrap_or(0);
            if let Some(expected) = expected_revision
                && expected != current
            {
                return Err(StorageError::Conflict {
                    key: key.to_string(),
                    expected,
                    actual: current,
                });
            }

            let old_value = items.get(key)?.map(|guard| guard.value().to_string());
            match (new_value, &old_value) {
                (Some(raw), _) => {
                    items.insert(key, raw)?;
                }
                (None, Some(_)) => {
                    items.remove(key)?;
                }
                (None, None) => {
                    drop((items, revisions));
                    write_txn.abort()?;
                    return Ok((false, current));
                }
            }
            let next = current + 1;
            revisions.insert(key, next)?;
            (old_value, next)
        };
        let (old_value, revision) = change;
        write_txn.commit()?;

        self.sync.publish(StorageChange {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
            old_value,
            revision,
            origin: self.origin.clone(),
            timestamp: shared::util::now_iso(),
        });
        Ok((true, revision))
    }

    // ========== Best-effort API ==========

    /// Read and decode `key`, falling back to `default`
    ///
    /// Absent keys return `default` without persisting it. Decode and
    /// storage failures are logged.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read_raw(key) {
            Ok((Some(raw), _)) => codec::decode_lenient(key, &raw).unwrap_or(default),
            Ok((None, _)) => default,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to read item");
                default
            }
        }
    }

    /// Serialize and write `value`; failures are logged, not returned
    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set_item(key, value) {
            tracing::error!(key = %key, error = %e, "Failed to write item");
        }
    }

    /// Remove `key`; failures are logged, not returned
    pub fn remove_item(&self, key: &str) {
        if let Err(e) = self.delete_raw(key, None) {
            tracing::error!(key = %key, error = %e, "Failed to remove item");
        }
    }

    // ========== Cross-tab notifications ==========

    /// Receiver of changes made by other tabs
    pub fn changes(&self) -> ChangeReceiver {
        self.sync.receiver(self.origin.clone())
    }

    /// Call `callback` for every change made by another tab
    ///
    /// Runs on the current Tokio runtime until the returned handle is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> StorageResult<Subscription>
    where
        F: Fn(&StorageChange) + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| StorageError::NoRuntime)?;
        let token = CancellationToken::new();
        let cancel = token.clone();
        let mut rx = self.changes();

        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = rx.recv() => match change {
                        Some(change) => callback(&change),
                        None => break,
                    },
                }
            }
            tracing::debug!(origin = %rx.origin(), "Storage subscription ended");
        });

        Ok(Subscription::new(token))
    }
}

fn new_origin() -> String {
    uuid::Uuid::new_v4().to_string()
}
