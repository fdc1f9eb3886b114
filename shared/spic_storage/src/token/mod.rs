//! Photo-host access tokens
//!
//! There is no active flag: the row with the highest id is the token in use.

use sqlx::{FromRow, SqlitePool};

use crate::StorageResult;

/// A persisted provider access token
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Token {
    /// Sequential primary key
    pub id: i64,
    /// Provider access token
    pub token: String,
}

/// Storage client for the `tokens` table
#[derive(Clone, Debug)]
pub struct TokenStorage {
    pool: SqlitePool,
}

impl TokenStorage {
    /// Creates a new storage instance over an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists a new token, which becomes the latest one
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the insert fails
    pub async fn create(&self, token: &str) -> StorageResult<Token> {
        let created = sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (token) VALUES ($1) RETURNING id, token",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// The token with the highest id, if any token was ever stored
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the query fails
    pub async fn latest(&self) -> StorageResult<Option<Token>> {
        let token =
            sqlx::query_as::<_, Token>("SELECT id, token FROM tokens ORDER BY id DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(token)
    }
}
