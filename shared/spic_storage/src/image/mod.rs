//! Image records
//!
//! An image row points at a file held by an upload backend. Rows are created
//! once the backend has stored the file and are only ever deleted, never updated.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::StorageResult;

/// A stored image
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Image {
    /// Sequential primary key, never reused
    pub id: i64,
    /// Backend locator of the stored file
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether the photo-host backend stored the file
    pub flickr: bool,
}

/// Values for a new image row
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Backend locator of the stored file
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Whether the photo-host backend stored the file
    pub flickr: bool,
}

/// Storage client for the `images` table
#[derive(Clone, Debug)]
pub struct ImageStorage {
    pool: SqlitePool,
}

impl ImageStorage {
    /// Creates a new storage instance over an existing pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new image and returns it with its assigned id
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the insert fails
    pub async fn create(&self, image: NewImage) -> StorageResult<Image> {
        let created = sqlx::query_as::<_, Image>(
            "INSERT INTO images (name, created_at, flickr) VALUES ($1, $2, $3)
             RETURNING id, name, created_at, flickr",
        )
        .bind(&image.name)
        .bind(image.created_at)
        .bind(image.flickr)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = created.id, name = %created.name, "Created image");
        Ok(created)
    }

    /// Looks up an image by id. A missing row is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the query fails
    pub async fn find(&self, id: i64) -> StorageResult<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, name, created_at, flickr FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    /// Deletes an image by id, returning whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the delete fails
    pub async fn delete(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any row still points at the given locator
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the query fails
    pub async fn exists_by_name(&self, name: &str) -> StorageResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM images WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// All images, newest first
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the query fails
    pub async fn list(&self) -> StorageResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            "SELECT id, name, created_at, flickr FROM images ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}
