//! Connection pool and schema migrations

use std::str::FromStr;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::info;

use crate::StorageResult;

/// Embedded migrations, applied in name order and recorded in `_sqlx_migrations`
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const MAX_CONNECTIONS: u32 = 5;

/// Handle to the relational store
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens a connection pool for the given `SQLite` URL, creating the file if needed.
    ///
    /// In-memory URLs are pinned to a single connection that is never recycled,
    /// otherwise every pooled connection would see its own empty database.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the URL is invalid or the database cannot be opened
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Applies pending migrations. Migrations already recorded in the ledger are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Migration` if a migration fails or the ledger is inconsistent
    pub async fn migrate(&self) -> StorageResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Database schema is up to date"
        );
        Ok(())
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
