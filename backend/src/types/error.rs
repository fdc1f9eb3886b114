//! Universal error handling for the HTTP layer

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use spic_storage::StorageError;

use crate::upload_backend::{FlickrError, UploadError};

/// Application error rendered as a small HTML page
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Shared secret mismatch
    #[must_use]
    pub const fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "forbidden",
            "The shared secret does not match",
        )
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.code, self.message),
            500..=599 => tracing::error!("Server error: {} - {}", self.code, self.message),
            _ => {}
        }

        let reason = self.status.canonical_reason().unwrap_or("Error");
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{reason}</title></head>\
             <body><h1>{reason}</h1><p>{}</p></body></html>\n",
            self.message
        );

        (self.status, Html(body)).into_response()
    }
}

/// Convert storage errors to application errors
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Storage error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

/// Convert upload backend errors to application errors
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        use UploadError::{InvalidFile, MissingToken, Rejected, Storage, Unavailable, Upstream};

        match err {
            InvalidFile(name) => {
                tracing::warn!("Unusable file name: {name:?}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_file",
                    "The uploaded file name is not usable",
                )
            }
            MissingToken => {
                tracing::error!("Upload attempted before the photo host was authorized");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "missing_token",
                    "The photo host has not been authorized yet",
                )
            }
            Rejected(msg) | Upstream(msg) => {
                tracing::error!("Storage provider error: {msg}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "The storage provider rejected the upload",
                )
            }
            Unavailable(msg) => {
                tracing::error!("Storage provider unavailable: {msg}");
                Self::new(
                    StatusCode::GATEWAY_TIMEOUT,
                    "upstream_unavailable",
                    "The storage provider could not be reached",
                )
            }
            Storage(storage) => storage.into(),
        }
    }
}

/// Convert photo-host auth flow errors to application errors
impl From<FlickrError> for AppError {
    fn from(err: FlickrError) -> Self {
        if let FlickrError::Storage(storage) = err {
            return storage.into();
        }

        tracing::error!("Photo host error: {err}");
        Self::new(
            StatusCode::BAD_GATEWAY,
            "upstream_error",
            "The photo host rejected the request",
        )
    }
}

/// Convert malformed multipart bodies to application errors
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!("Multipart error: {err}");
        Self::new(
            err.status(),
            "invalid_form",
            "The upload form could not be read",
        )
    }
}

/// Convert template errors to application errors
impl From<handlebars::RenderError> for AppError {
    fn from(err: handlebars::RenderError) -> Self {
        tracing::error!("Template error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}
