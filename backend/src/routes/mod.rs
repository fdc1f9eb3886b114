mod flickr;
mod gallery;
mod health;
mod images;
mod pages;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{middleware::require_path_secret, types::BackendKind};

/// Largest accepted upload body (15 MiB)
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Creates the router with all handler routes
///
/// The photo-host auth routes only exist when that backend is configured.
pub fn handler(backend: BackendKind) -> Router {
    let router = Router::new()
        .route("/", get(pages::home))
        .route("/health", get(health::handler))
        .route("/u", get(pages::redirect_home))
        .route("/u/", get(pages::redirect_home))
        .route("/u/{id}", get(pages::permalink))
        .route(
            "/p",
            post(images::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/d", post(images::delete))
        .route(
            "/{secret}",
            get(gallery::handler).route_layer(middleware::from_fn(require_path_secret)),
        );

    match backend {
        BackendKind::S3 => router,
        BackendKind::Flickr => router
            .route("/flickr-authenticate", get(flickr::authenticate))
            .route("/flickr-callback", get(flickr::callback)),
    }
}
