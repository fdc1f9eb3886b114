//! Object storage backend

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, types::ObjectCannedAcl, Client as S3Client};
use tracing::{debug, instrument};

use super::{sanitize_filename, StoredFile, UploadBackend, UploadFile, UploadResult};
use crate::types::{BackendKind, S3Settings};

/// Uploads files to the root of an S3 bucket
pub struct S3Backend {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    host: String,
}

impl S3Backend {
    /// Creates a new S3 backend
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `settings` - Bucket name and public host
    #[must_use]
    pub fn new(s3_client: Arc<S3Client>, settings: &S3Settings) -> Self {
        Self {
            s3_client,
            bucket_name: settings.bucket.clone(),
            host: settings.host.clone(),
        }
    }
}

#[async_trait]
impl UploadBackend for S3Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.bytes.len()))]
    async fn store(&self, file: UploadFile) -> UploadResult<StoredFile> {
        let locator = sanitize_filename(&file.filename)?;
        let content_type = file
            .content_type
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&locator)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(file.bytes))
            .send()
            .await?;

        debug!(locator = %locator, bucket = %self.bucket_name, "Stored object");
        Ok(StoredFile { locator })
    }

    /// Built by hand: the SDK's own object URL answers with a permanent
    /// redirect for buckets outside the default region, which breaks direct links.
    fn public_url(&self, locator: &str) -> String {
        format!("http://{}.{}/{locator}", self.bucket_name, self.host)
    }

    #[instrument(skip(self))]
    async fn remove(&self, locator: &str) -> UploadResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(locator)
            .send()
            .await?;

        debug!(locator = %locator, bucket = %self.bucket_name, "Removed object");
        Ok(())
    }
}
