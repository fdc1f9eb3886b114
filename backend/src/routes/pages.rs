use std::sync::Arc;

use axum::{
    extract::Path,
    response::{Html, Redirect},
    Extension,
};
use spic_storage::image::ImageStorage;
use tracing::instrument;

use crate::{pages::Pages, types::AppError, upload_backend::UploadBackend};

/// Landing page
///
/// # Errors
///
/// Returns `AppError` if the page fails to render
pub async fn home(Extension(pages): Extension<Arc<Pages>>) -> Result<Html<String>, AppError> {
    pages.home()
}

/// Bare `/u` has no image to show
pub async fn redirect_home() -> Redirect {
    Redirect::to("/")
}

/// Shows the public URL of an image
///
/// An unknown or non-numeric id renders the empty state rather than an error.
///
/// # Errors
///
/// Returns `AppError` if the lookup or rendering fails
#[instrument(skip(image_storage, backend, pages))]
pub async fn permalink(
    Extension(image_storage): Extension<Arc<ImageStorage>>,
    Extension(backend): Extension<Arc<dyn UploadBackend>>,
    Extension(pages): Extension<Arc<Pages>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let image = match id.parse::<i64>() {
        Ok(id) => image_storage.find(id).await?,
        Err(_) => None,
    };

    let url = image.map(|image| backend.public_url(&image.name));
    pages.permalink(url.as_deref())
}
