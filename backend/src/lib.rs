//! SPIC, a minimal image-sharing service

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Request middleware
pub mod middleware;

/// Server-rendered HTML pages
pub mod pages;

/// HTTP routes
pub mod routes;

/// Server wiring
pub mod server;

/// Configuration, environment and errors
pub mod types;

/// Pluggable file storage
pub mod upload_backend;
