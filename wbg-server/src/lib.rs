//! HTTP front end for the gallery: uploads, per-date image listings and folder index
//! reconciliation, plus static serving of the uploaded images and the catalog script.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use wbg_gallery::Gallery;

pub mod config;
pub mod handlers;
pub mod response;

pub use config::ServerConfig;

#[derive(Clone, Debug)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
    pub upload_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            gallery: Arc::new(gallery),
            upload_timeout: Duration::from_secs(config::DEFAULT_UPLOAD_TIMEOUT_SECS),
            max_upload_bytes: config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            gallery: Arc::new(config.gallery()),
            upload_timeout: config.upload_timeout,
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let store_root = state.gallery.store().base().to_path_buf();
    let prefix = state.gallery.store().public_prefix().trim_matches('/').to_string();
    let script = state.gallery.catalog().script_path().to_path_buf();

    let mut router = Router::new()
        .route(
            "/upload",
            post(handlers::upload).fallback(handlers::invalid_upload_method),
        )
        .route(
            "/uploader",
            post(handlers::upload).fallback(handlers::invalid_upload_method),
        )
        .route("/list-images", get(handlers::list_images))
        .route(
            "/update-folder-list",
            get(handlers::update_folder_list).post(handlers::update_folder_list),
        );

    if let Some(script_name) = script.file_name().and_then(|value| value.to_str()) {
        router = router.route_service(&format!("/{}", script_name), ServeFile::new(&script));
    }

    if !prefix.is_empty() {
        router = router.nest_service(&format!("/{}", prefix), ServeDir::new(store_root));
    }

    router
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> Result<(), std::io::Error> {
    let app = build_router(AppState::from_config(&config));
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;

    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", error);
            }
        })
        .await
}
