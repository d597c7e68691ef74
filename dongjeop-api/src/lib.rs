//! dongjeop-api library - accessibility review service
//!
//! Serves the labeled restaurant-photo dataset with computed accessibility
//! scores, aggregate statistics and batch listings, and runs vision-model
//! analysis over collected photo batches.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use dongjeop_common::config::DataPaths;
use dongjeop_common::RecordStore;

pub mod analysis;
pub mod api;
pub mod collection;
pub mod error;
pub mod pagination;
pub mod vision;

use vision::VisionAnalyzer;

/// Pause between vision calls unless configured otherwise
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Dataset store (cached snapshot + single writer)
    pub store: Arc<RecordStore>,
    /// Resolved data locations
    pub paths: Arc<DataPaths>,
    /// Vision analyzer; `None` when no API key is configured
    pub analyzer: Option<Arc<dyn VisionAnalyzer>>,
    /// Pause between consecutive vision calls within one batch
    pub request_interval: Duration,
}

impl AppState {
    /// Create new application state without an analyzer
    pub fn new(store: Arc<RecordStore>, paths: DataPaths) -> Self {
        Self {
            store,
            paths: Arc::new(paths),
            analyzer: None,
            request_interval: DEFAULT_REQUEST_INTERVAL,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }
}

/// Build application router
///
/// Image directories are mounted only when they exist at startup.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let mut router = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/statistics", get(api::get_statistics))
        .route("/api/summary", get(api::get_summary))
        .route("/api/reload", post(api::reload_dataset))
        .route("/api/images", get(api::list_images))
        .route("/api/images/*file_path", get(api::get_image))
        .route("/api/batches", get(api::list_batches))
        .route("/api/batches/:batch/images", get(api::list_batch_images))
        .route("/api/batches/:batch/analyze", post(api::analyze_batch))
        .route("/api/analyze/images", post(api::analyze_images))
        .merge(api::health_routes());

    if state.paths.images.is_dir() {
        info!("Serving labeled images from {}", state.paths.images.display());
        router = router.nest_service("/images", ServeDir::new(&state.paths.images));
    }
    if state.paths.collection.is_dir() {
        info!("Serving collected images from {}", state.paths.collection.display());
        router = router.nest_service("/spider-images", ServeDir::new(&state.paths.collection));
    }

    router.with_state(state)
}

/// CORS restricted to the configured front-end origins
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
