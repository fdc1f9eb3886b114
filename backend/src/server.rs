use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router};
use spic_storage::image::ImageStorage;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    pages::Pages,
    routes,
    types::{Environment, Settings},
    upload_backend::{FlickrBackend, UploadBackend},
};

/// Upper bound for a whole request, including the backend upload
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Everything the handlers need, built once at startup
#[derive(Clone)]
pub struct AppContext {
    /// Validated settings
    pub settings: Arc<Settings>,
    /// Image table
    pub image_storage: Arc<ImageStorage>,
    /// Configured upload backend
    pub backend: Arc<dyn UploadBackend>,
    /// Photo-host auth flow, present only for that backend
    pub flickr: Option<Arc<FlickrBackend>>,
    /// Page renderer
    pub pages: Arc<Pages>,
}

/// Builds the full application router with its dependencies attached
pub fn router(context: AppContext) -> Router {
    let mut router = routes::handler(context.settings.backend_kind())
        .layer(Extension(context.settings))
        .layer(Extension(context.image_storage))
        .layer(Extension(context.backend))
        .layer(Extension(context.pages));

    if let Some(flickr) = context.flickr {
        router = router.layer(Extension(flickr));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(environment: Environment, context: AppContext) -> anyhow::Result<()> {
    let router = router(context);

    let addr = SocketAddr::from(([0, 0, 0, 0], environment.port()?));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 SPIC started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Received shutdown signal, shutting down gracefully...");
}
