use std::sync::Arc;

use axum::{response::Html, Extension};
use spic_storage::image::ImageStorage;
use tracing::instrument;

use crate::{
    pages::{GalleryItem, Pages},
    types::{AppError, Settings},
    upload_backend::UploadBackend,
};

/// Lists every image, newest first, with upload and delete forms
///
/// Only reachable through `require_path_secret`.
///
/// # Errors
///
/// Returns `AppError` if the listing or rendering fails
#[instrument(skip_all)]
pub async fn handler(
    Extension(settings): Extension<Arc<Settings>>,
    Extension(image_storage): Extension<Arc<ImageStorage>>,
    Extension(backend): Extension<Arc<dyn UploadBackend>>,
    Extension(pages): Extension<Arc<Pages>>,
) -> Result<Html<String>, AppError> {
    let items: Vec<GalleryItem> = image_storage
        .list()
        .await?
        .into_iter()
        .map(|image| GalleryItem {
            url: backend.public_url(&image.name),
            id: image.id,
            name: image.name,
        })
        .collect();

    pages.gallery(settings.secret(), &items)
}
