use std::sync::Arc;

use anyhow::Context;
use aws_sdk_s3::Client as S3Client;
use spic::{
    pages::Pages,
    server::{self, AppContext},
    types::{BackendSettings, Environment, Settings},
    upload_backend::{FlickrBackend, FlickrClient, S3Backend, UploadBackend},
};
use spic_storage::{image::ImageStorage, token::TokenStorage, Database};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    // JSON logs for staging/production, plain text for development
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().to_string()));
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let settings = Arc::new(
        Settings::load(environment.settings_path()).context("Failed to load settings")?,
    );

    let database = Database::connect(&environment.database_url())
        .await
        .context("Failed to open database")?;
    database
        .migrate()
        .await
        .context("Failed to run migrations")?;

    let image_storage = Arc::new(ImageStorage::new(database.pool().clone()));

    let (backend, flickr): (Arc<dyn UploadBackend>, Option<Arc<FlickrBackend>>) =
        match settings.backend() {
            BackendSettings::S3(s3) => {
                let s3_client = Arc::new(S3Client::from_conf(
                    environment.s3_client_config(s3).await,
                ));
                let backend: Arc<dyn UploadBackend> = Arc::new(S3Backend::new(s3_client, s3));
                (backend, None)
            }
            BackendSettings::Flickr(flickr_settings) => {
                let tokens = Arc::new(TokenStorage::new(database.pool().clone()));
                let flickr = Arc::new(FlickrBackend::new(
                    FlickrClient::new(flickr_settings),
                    tokens,
                ));
                let backend: Arc<dyn UploadBackend> = flickr.clone();
                (backend, Some(flickr))
            }
        };

    tracing::info!(backend = %settings.backend_kind(), "Upload backend ready");

    let pages = Arc::new(Pages::new().context("Failed to compile templates")?);

    server::start(
        environment,
        AppContext {
            settings,
            image_storage,
            backend,
            flickr,
            pages,
        },
    )
    .await
}
