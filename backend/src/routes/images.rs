use std::sync::Arc;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::Redirect,
    Extension, Form,
};
use chrono::Utc;
use serde::Deserialize;
use spic_storage::image::{ImageStorage, NewImage};
use tracing::{info, instrument, warn};

use crate::{
    types::{AppError, BackendKind, Settings},
    upload_backend::{UploadBackend, UploadFile},
};

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    secret: String,
    #[serde(default)]
    id: String,
}

/// Stores an uploaded file and records it as a new image
///
/// The row is only created after the backend accepted the file, so a failed
/// upload never leaves an image pointing at nothing.
///
/// # Errors
///
/// - `AppError::forbidden` - Secret field missing or wrong
/// - `missing_file` - No file was attached
/// - `UploadError` - Backend refused or could not be reached
/// - `StorageError` - Row could not be inserted
#[instrument(skip_all)]
pub async fn upload(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(image_storage): Extension<Arc<ImageStorage>>,
    Extension(backend): Extension<Arc<dyn UploadBackend>>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut secret = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("secret") => secret = Some(field.text().await?),
            Some("name") => {
                let filename = field.file_name().map(ToString::to_string).unwrap_or_default();
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await?;

                // Browsers send an empty part when no file was picked
                if !filename.is_empty() {
                    file = Some(UploadFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    if !secret.is_some_and(|secret| settings.verify_secret(&secret)) {
        return Err(AppError::forbidden());
    }

    let file = file.ok_or(AppError::new(
        StatusCode::BAD_REQUEST,
        "missing_file",
        "No file was uploaded",
    ))?;

    let stored = backend.store(file).await?;
    let image = image_storage
        .create(NewImage {
            name: stored.locator,
            created_at: Utc::now(),
            flickr: backend.kind() == BackendKind::Flickr,
        })
        .await?;

    info!(id = image.id, name = %image.name, "Image uploaded");
    Ok(Redirect::to(&format!("/u/{}", image.id)))
}

/// Deletes an image row, then its stored file
///
/// Unknown ids are ignored. The file is kept while another row still points
/// at the same locator, and a failed removal only gets logged.
///
/// The shared-locator check and `remove` are not atomic: an upload of the same
/// name landing between them can lose its file. Nothing locks across requests.
///
/// # Errors
///
/// - `AppError::forbidden` - Secret field missing or wrong
/// - `StorageError` - Row could not be read or deleted
#[instrument(skip(settings, image_storage, backend, form), fields(id = %form.id))]
pub async fn delete(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(image_storage): Extension<Arc<ImageStorage>>,
    Extension(backend): Extension<Arc<dyn UploadBackend>>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
    if !settings.verify_secret(&form.secret) {
        return Err(AppError::forbidden());
    }

    let Ok(id) = form.id.trim().parse::<i64>() else {
        return Ok(Redirect::to("/"));
    };

    let Some(image) = image_storage.find(id).await? else {
        return Ok(Redirect::to("/"));
    };

    if image_storage.delete(id).await? && !image_storage.exists_by_name(&image.name).await? {
        if let Err(e) = backend.remove(&image.name).await {
            warn!(name = %image.name, "Failed to remove stored file: {e}");
        }
    }

    info!(id, "Image deleted");
    Ok(Redirect::to("/"))
}
