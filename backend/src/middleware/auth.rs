use std::sync::Arc;

use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::types::{AppError, Settings};

/// Shared-secret middleware for routes whose path is the secret itself
///
/// Compares the `secret` path segment with the configured secret on every
/// request, in constant time. A mismatch never reaches the handler.
///
/// # Errors
///
/// - `AppError::forbidden` - Path segment does not match the shared secret
pub async fn require_path_secret(
    Extension(settings): Extension<Arc<Settings>>,
    Path(secret): Path<String>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !settings.verify_secret(&secret) {
        return Err(AppError::forbidden());
    }

    Ok(next.run(request).await)
}
