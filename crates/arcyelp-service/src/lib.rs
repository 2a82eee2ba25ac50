//! ArcGIS feature-service facade over Yelp business search.
//!
//! # Endpoints
//!
//! - `GET /` - feature-server description
//! - `GET /0` - layer definition
//! - `GET|POST /0/query` - features from a live search or from the store
//! - `GET /health` - health check

use std::collections::BTreeSet;
use std::sync::Arc;

use arcyelp_core::KeepKeys;
use arcyelp_core::enrich::DEFAULT_RESOLUTIONS;
use arcyelp_fusion::FusionClient;
use arcyelp_store::DocumentStore;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod error;
pub mod layer;
pub mod params;
mod query;

pub use error::ServiceError;
pub use params::QueryParams;

/// What the service advertises and how it shapes records.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub name: String,
    pub description: String,
    pub resolutions: BTreeSet<u8>,
    pub keep_keys: KeepKeys,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "Yelp Items".into(),
            description: "Yelp passthrough service.".into(),
            resolutions: DEFAULT_RESOLUTIONS.collect(),
            keep_keys: KeepKeys::default(),
        }
    }
}

/// Collaborators shared by every handler.
///
/// Either collaborator may be absent; queries that need a missing one fail
/// with 503.
#[derive(Clone)]
pub struct AppState {
    pub fusion: Option<FusionClient>,
    pub store: Option<Arc<dyn DocumentStore>>,
    pub settings: Arc<ServiceSettings>,
}

impl AppState {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            fusion: None,
            store: None,
            settings: Arc::new(settings),
        }
    }

    pub fn with_fusion(mut self, client: FusionClient) -> Self {
        self.fusion = Some(client);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/0", get(layer_info))
        .route("/0/query", get(query::layer_query).post(query::layer_query))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(layer::service_info(&state.settings))
}

async fn layer_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(layer::layer_info(&state.settings))
}
