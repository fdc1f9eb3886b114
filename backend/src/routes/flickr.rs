use std::sync::Arc;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, Redirect},
    Extension,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{pages::Pages, types::AppError, upload_backend::FlickrBackend};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    frob: Option<String>,
}

/// Sends the account owner to the photo host to grant write access
pub async fn authenticate(Extension(flickr): Extension<Arc<FlickrBackend>>) -> Redirect {
    Redirect::to(flickr.begin_auth().as_str())
}

/// Completes authorization with the frob handed back by the photo host
///
/// # Errors
///
/// - `missing_frob` - Callback carried no frob
/// - `FlickrError` - Token exchange or persistence failed
#[instrument(skip(flickr, pages))]
pub async fn callback(
    Extension(flickr): Extension<Arc<FlickrBackend>>,
    Extension(pages): Extension<Arc<Pages>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<String>, AppError> {
    let frob = query.frob.filter(|frob| !frob.is_empty()).ok_or(AppError::new(
        StatusCode::BAD_REQUEST,
        "missing_frob",
        "The callback did not include a frob",
    ))?;

    flickr.complete_auth(&frob).await?;
    pages.flickr_authenticated()
}
