//! Error types for the photo-host client

use spic_storage::StorageError;
use thiserror::Error;

use crate::upload_backend::UploadError;

/// Result type for photo-host operations
pub type FlickrResult<T> = Result<T, FlickrError>;

/// Errors that can occur while talking to the photo host
#[derive(Error, Debug)]
pub enum FlickrError {
    /// Request could not be sent or timed out
    #[error("Request to photo host failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// Response body could not be read
    #[error("Failed to read photo host response: {0}")]
    Body(#[from] reqwest::Error),

    /// Photo host answered with a non-success HTTP status
    #[error("Photo host returned HTTP {0}")]
    Status(u16),

    /// Photo host answered with `stat="fail"`
    #[error("Photo host error {code}: {message}")]
    Api {
        /// Provider error code
        code: String,
        /// Provider error message
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected photo host response: {0}")]
    MalformedResponse(String),

    /// Token could not be persisted or loaded
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<FlickrError> for UploadError {
    fn from(error: FlickrError) -> Self {
        match error {
            FlickrError::Transport(ref err) if is_unreachable(err) => {
                Self::Unavailable(error.to_string())
            }
            FlickrError::Status(status) if status >= 500 => Self::Upstream(error.to_string()),
            FlickrError::Api { .. } | FlickrError::Status(_) => Self::Rejected(error.to_string()),
            FlickrError::Storage(storage) => Self::Storage(storage),
            _ => Self::Upstream(error.to_string()),
        }
    }
}

fn is_unreachable(error: &reqwest_middleware::Error) -> bool {
    match error {
        reqwest_middleware::Error::Reqwest(err) => err.is_timeout() || err.is_connect(),
        reqwest_middleware::Error::Middleware(_) => false,
    }
}
