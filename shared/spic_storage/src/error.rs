//! Error types for storage operations

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to apply a schema migration
    #[error("Failed to apply migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
