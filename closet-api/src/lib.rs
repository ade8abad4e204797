//! closet-api library interface
//!
//! Wardrobe cataloguing and outfit suggestion over HTTP. Exposes the router
//! and its state so integration tests can drive the service in-process.

pub mod api;
pub mod db;
pub mod error;
pub mod storage;
pub mod vision;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::storage::ItemStorage;
use crate::vision::{Classifier, DisabledClassifier};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Blob store for item images
    pub storage: ItemStorage,
    pub classifier: Arc<dyn Classifier>,
    /// Classify each upload before responding
    pub auto_classify: bool,
    /// Browser origins allowed by CORS
    pub cors_origins: Arc<Vec<String>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, storage: ItemStorage) -> Self {
        Self {
            db,
            storage,
            classifier: Arc::new(DisabledClassifier),
            auto_classify: false,
            cors_origins: Arc::new(Vec::new()),
            startup_time: Utc::now(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_auto_classify(mut self, auto_classify: bool) -> Self {
        self.auto_classify = auto_classify;
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Arc::new(origins);
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(AllowHeaders::any())
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let images = ServeDir::new(state.storage.root());
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .merge(api::health_routes())
        .merge(api::user_routes())
        .merge(api::item_routes())
        .merge(api::outfit_routes())
        .nest_service("/images", images)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
