//! Unified error type for record-store operations.

use thiserror::Error;

/// Top-level error for the `tenant-store` crate.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown tenant or record.
    #[error("record not found")]
    NotFound,

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored JSON column could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
