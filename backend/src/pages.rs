//! Server-rendered HTML pages

use axum::response::Html;
use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use serde_json::json;

use crate::types::AppError;

const HOME: &str = "home";
const PERMALINK: &str = "permalink";
const GALLERY: &str = "gallery";
const FLICKR_AUTHENTICATED: &str = "flickr_authenticated";

/// One row of the gallery listing
#[derive(Debug, Clone, Serialize)]
pub struct GalleryItem {
    /// Image id, used by the delete form
    pub id: i64,
    /// Backend locator
    pub name: String,
    /// Public URL of the stored file
    pub url: String,
}

/// Template registry for every page the service renders
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    /// Compiles the bundled templates
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if a bundled template does not parse
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry.register_template_string(HOME, include_str!("../templates/home.hbs"))?;
        registry.register_template_string(PERMALINK, include_str!("../templates/permalink.hbs"))?;
        registry.register_template_string(GALLERY, include_str!("../templates/gallery.hbs"))?;
        registry.register_template_string(
            FLICKR_AUTHENTICATED,
            include_str!("../templates/flickr_authenticated.hbs"),
        )?;

        Ok(Self { registry })
    }

    /// Landing page
    ///
    /// # Errors
    ///
    /// Returns `AppError` if rendering fails
    pub fn home(&self) -> Result<Html<String>, AppError> {
        self.render(HOME, &json!({}))
    }

    /// Permalink page; `None` renders the empty state
    ///
    /// # Errors
    ///
    /// Returns `AppError` if rendering fails
    pub fn permalink(&self, url: Option<&str>) -> Result<Html<String>, AppError> {
        self.render(PERMALINK, &json!({ "url": url }))
    }

    /// Gallery with the upload form and one delete form per image
    ///
    /// # Errors
    ///
    /// Returns `AppError` if rendering fails
    pub fn gallery(&self, secret: &str, images: &[GalleryItem]) -> Result<Html<String>, AppError> {
        self.render(GALLERY, &json!({ "secret": secret, "images": images }))
    }

    /// Confirmation shown after the photo-host callback stored a token
    ///
    /// # Errors
    ///
    /// Returns `AppError` if rendering fails
    pub fn flickr_authenticated(&self) -> Result<Html<String>, AppError> {
        self.render(FLICKR_AUTHENTICATED, &json!({}))
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        Ok(Html(self.registry.render(name, data)?))
    }
}
