//! Photo-host upload backend
//!
//! The account owner authorizes the service once through the browser flow.
//! The resulting token is persisted and the latest one signs every upload.

mod client;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use spic_storage::token::{Token, TokenStorage};
use tracing::{error, info, instrument};
use url::Url;

pub use client::{FlickrClient, FlickrEndpoints};
pub use error::{FlickrError, FlickrResult};

use super::{StoredFile, UploadBackend, UploadError, UploadFile, UploadResult};
use crate::types::BackendKind;

/// Tag attached to every uploaded photo
const UPLOAD_TAG: &str = "spic";

/// Uploads files to the photo host on behalf of the authorized account
pub struct FlickrBackend {
    client: FlickrClient,
    tokens: Arc<TokenStorage>,
}

impl FlickrBackend {
    /// Creates a new photo-host backend
    #[must_use]
    pub const fn new(client: FlickrClient, tokens: Arc<TokenStorage>) -> Self {
        Self { client, tokens }
    }

    /// URL the account owner visits to start authorization
    #[must_use]
    pub fn begin_auth(&self) -> Url {
        self.client.authorize_url()
    }

    /// Exchanges the callback frob for a token and stores it as the latest
    ///
    /// # Errors
    ///
    /// Returns `FlickrError` if the exchange fails or the token cannot be stored
    #[instrument(skip(self))]
    pub async fn complete_auth(&self, frob: &str) -> FlickrResult<Token> {
        let access_token = self.client.get_token(frob).await?;
        let token = self.tokens.create(&access_token).await?;

        info!(token_id = token.id, "Stored photo host access token");
        Ok(token)
    }
}

#[async_trait]
impl UploadBackend for FlickrBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Flickr
    }

    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.bytes.len()))]
    async fn store(&self, file: UploadFile) -> UploadResult<StoredFile> {
        let token = self
            .tokens
            .latest()
            .await?
            .ok_or(UploadError::MissingToken)?;

        let photo_id = self
            .client
            .upload(&token.token, file, UPLOAD_TAG)
            .await
            .map_err(|e| {
                error!("Photo host upload failed: {e}");
                UploadError::from(e)
            })?;

        Ok(StoredFile { locator: photo_id })
    }

    fn public_url(&self, locator: &str) -> String {
        format!("https://www.flickr.com/photo.gne?id={locator}")
    }

    async fn remove(&self, locator: &str) -> UploadResult<()> {
        info!(locator = %locator, "Photo host files are kept on delete");
        Ok(())
    }
}
