use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use spic::{
    pages::Pages,
    server::{self, AppContext},
    types::{BackendKind, BackendSettings, S3Settings, Settings},
    upload_backend::{
        sanitize_filename, FlickrBackend, StoredFile, UploadBackend, UploadError, UploadFile,
        UploadResult,
    },
};
use spic_storage::{image::ImageStorage, token::TokenStorage, Database};
use tower::ServiceExt;

use super::utils::MultipartBody;

/// Shared secret used by every test setup
pub const SECRET: &str = "hunter2";

/// Public URL prefix of the recording backend
pub const RECORDING_URL_PREFIX: &str = "https://files.test/";

/// Setup test environment with tracing enabled
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Settings for the S3 variant with the test secret
pub fn s3_settings(bucket: &str) -> Settings {
    Settings::new(
        SECRET.to_string(),
        BackendSettings::S3(S3Settings {
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
            bucket: bucket.to_string(),
            region: "us-east-1".to_string(),
            host: "s3.amazonaws.com".to_string(),
        }),
    )
}

/// Fresh in-memory database with all migrations applied
pub async fn test_database() -> Database {
    let database = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    database.migrate().await.expect("Failed to run migrations");
    database
}

/// In-process backend that records calls instead of talking to a provider
#[derive(Default)]
pub struct RecordingBackend {
    pub stored: Mutex<Vec<UploadFile>>,
    pub removed: Mutex<Vec<String>>,
    pub fail_store: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl RecordingBackend {
    pub fn stored_names(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .map(|file| file.filename.clone())
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn fail_store(&self) {
        self.fail_store.store(true, Ordering::SeqCst);
    }

    pub fn fail_remove(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UploadBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn store(&self, file: UploadFile) -> UploadResult<StoredFile> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(UploadError::Upstream("provider exploded".to_string()));
        }

        let locator = sanitize_filename(&file.filename)?;
        self.stored.lock().unwrap().push(file);
        Ok(StoredFile { locator })
    }

    fn public_url(&self, locator: &str) -> String {
        format!("{RECORDING_URL_PREFIX}{locator}")
    }

    async fn remove(&self, locator: &str) -> UploadResult<()> {
        self.removed.lock().unwrap().push(locator.to_string());

        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(UploadError::Unavailable("provider unreachable".to_string()));
        }

        Ok(())
    }
}

/// Router with its dependencies, ready for `oneshot` requests
pub struct TestSetup {
    pub router: Router,
    pub database: Database,
    pub image_storage: Arc<ImageStorage>,
    pub token_storage: Arc<TokenStorage>,
}

impl TestSetup {
    /// Router backed by a fresh `RecordingBackend`
    pub async fn new() -> (Self, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::default());
        let setup = Self::with_backend(s3_settings("test-bucket"), backend.clone(), None).await;
        (setup, backend)
    }

    /// Router backed by the given backend and settings
    pub async fn with_backend(
        settings: Settings,
        backend: Arc<dyn UploadBackend>,
        flickr: Option<Arc<FlickrBackend>>,
    ) -> Self {
        let database = test_database().await;
        Self::with_database(database, settings, backend, flickr)
    }

    /// Router over an existing database
    pub fn with_database(
        database: Database,
        settings: Settings,
        backend: Arc<dyn UploadBackend>,
        flickr: Option<Arc<FlickrBackend>>,
    ) -> Self {
        setup_test_env();

        let image_storage = Arc::new(ImageStorage::new(database.pool().clone()));
        let token_storage = Arc::new(TokenStorage::new(database.pool().clone()));

        let router = server::router(AppContext {
            settings: Arc::new(settings),
            image_storage: image_storage.clone(),
            backend,
            flickr,
            pages: Arc::new(Pages::new().expect("Templates should compile")),
        });

        Self {
            router,
            database,
            image_storage,
            token_storage,
        }
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_form_request(&self, route: &str, form: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_multipart_request(&self, route: &str, body: MultipartBody) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", body.content_type())
            .body(Body::from(body.finish()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Uploads `filename` with the right secret
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Response {
        let body = MultipartBody::new()
            .text("secret", SECRET)
            .file("name", filename, "image/png", bytes);
        self.send_multipart_request("/p", body).await
    }

    /// Deletes `id` with the right secret
    pub async fn delete(&self, id: &str) -> Response {
        self.send_form_request("/d", &format!("secret={SECRET}&id={id}"))
            .await
    }

    pub async fn image_ids(&self) -> Vec<i64> {
        self.image_storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|image| image.id)
            .collect()
    }
}
