// Not every helper is used in every test
#![allow(dead_code)]

use spic_storage::Database;

/// Fresh in-memory database with all migrations applied
pub async fn migrated_database() -> Database {
    let database = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    database.migrate().await.expect("Failed to run migrations");
    database
}
