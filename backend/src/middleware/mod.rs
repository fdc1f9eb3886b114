/// Shared-secret checks
pub mod auth;

pub use auth::require_path_secret;
