//! Error types for upload backends

use aws_sdk_s3::{
    error::SdkError,
    operation::{delete_object::DeleteObjectError, put_object::PutObjectError},
};
use spic_storage::StorageError;
use thiserror::Error;

/// Result type for upload backend operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while storing or removing a file
#[derive(Error, Debug)]
pub enum UploadError {
    /// File name cannot be turned into a locator
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Photo-host upload attempted before the auth flow completed
    #[error("No photo host access token has been stored")]
    MissingToken,

    /// Provider answered and refused the operation
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    /// Provider failed (5xx)
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Provider could not be reached or timed out
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Local state needed for the upload could not be read
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SdkError<PutObjectError>> for UploadError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        from_sdk_error(error)
    }
}

impl From<SdkError<DeleteObjectError>> for UploadError {
    fn from(error: SdkError<DeleteObjectError>) -> Self {
        from_sdk_error(error)
    }
}

fn from_sdk_error<E: std::fmt::Debug>(error: SdkError<E>) -> UploadError {
    match error {
        SdkError::ServiceError(service_err) => {
            let message = format!("{:?}", service_err.err());
            if service_err.raw().status().as_u16() >= 500 {
                UploadError::Upstream(message)
            } else {
                UploadError::Rejected(message)
            }
        }
        error @ (SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)) => {
            UploadError::Unavailable(format!("{error:?}"))
        }
        error => UploadError::Upstream(format!("{error:?}")),
    }
}
