//! Pluggable storage for uploaded files
//!
//! A backend stores the bytes of an upload and hands back a locator, the only
//! thing persisted in the image table. Which backend runs is decided once at
//! startup from the settings.

mod error;
pub mod flickr;
mod s3;

use std::sync::LazyLock;

use async_trait::async_trait;
use axum::body::Bytes;
use regex::Regex;

pub use error::{UploadError, UploadResult};
pub use flickr::{FlickrBackend, FlickrClient, FlickrEndpoints, FlickrError};
pub use s3::S3Backend;

use crate::types::BackendKind;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.+\-]").expect("Invalid regex"));

/// A file received from the upload form
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name as sent by the client
    pub filename: String,
    /// Content type as sent by the client
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Bytes,
}

/// Outcome of a successful store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Backend locator, persisted as the image name
    pub locator: String,
}

/// Storage capability shared by every backend
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Stores the file and returns its locator
    async fn store(&self, file: UploadFile) -> UploadResult<StoredFile>;

    /// Publicly reachable URL for a locator
    fn public_url(&self, locator: &str) -> String;

    /// Removes a previously stored file
    async fn remove(&self, locator: &str) -> UploadResult<()>;
}

/// Turns a client-supplied file name into a locator
///
/// Only the last path segment is kept and every character outside
/// `[A-Za-z0-9_.+-]` becomes `_`.
///
/// # Errors
///
/// Returns `UploadError::InvalidFile` when nothing usable is left
pub fn sanitize_filename(filename: &str) -> UploadResult<String> {
    let last_segment = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let sanitized = UNSAFE_FILENAME_CHARS
        .replace_all(last_segment, "_")
        .into_owned();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return Err(UploadError::InvalidFile(filename.to_string()));
    }

    Ok(sanitized)
}
