//! Persistent store
//!
//! Durable key/value access shared by every tab of one installation, with
//! a broadcast channel announcing committed writes to the other tabs.

pub mod codec;
pub mod error;
pub mod kv;
pub mod schema;
pub mod sync;

pub use error::{StorageError, StorageResult};
pub use kv::KvStore;
pub use schema::{SCHEMA_VERSION, Versioned};
pub use sync::{ChangeReceiver, StorageChange, Subscription, SyncChannel};
