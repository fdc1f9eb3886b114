//! Persistent storage for spic
//!
//! Owns the `SQLite` schema, the migration ledger and the typed accessors for
//! the `images` and `tokens` tables.

mod database;
mod error;
pub mod image;
pub mod token;

pub use database::Database;
pub use error::{StorageError, StorageResult};
