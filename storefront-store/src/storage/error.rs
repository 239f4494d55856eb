use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored revision moved since the caller read the key
    #[error("Write conflict on '{key}': expected revision {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("Unsupported schema version {found} for '{key}' (max supported: {supported})")]
    UnsupportedSchema {
        key: String,
        found: u32,
        supported: u32,
    },

    #[error("No Tokio runtime available for subscription")]
    NoRuntime,
}

pub type StorageResult<T> = Result<T, StorageError>;
