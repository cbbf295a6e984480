pub mod config;
pub mod error;
pub mod invoker;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod routes;
pub mod store;
pub mod test_util;
pub mod vision;

pub use config::Config;
pub use error::{Error, Result};
pub use invoker::{InferenceBackend, InvokeError, ProcessBackend, ProcessInvoker};
pub use llm::ExplainClient;
pub use orchestrator::{PredictionOrchestrator, PredictionOutcome};
pub use store::{PredictionStore, SqliteStore, StoreError};
pub use vision::VisionClient;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub orchestrator: PredictionOrchestrator,
    /// Prediction history, shared with the orchestrator.
    pub store: Arc<dyn PredictionStore>,
    pub explain_client: ExplainClient,
    pub vision_client: VisionClient,
}

impl AppState {
    pub fn new(
        config: Config,
        backend: Arc<dyn InferenceBackend>,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            orchestrator: PredictionOrchestrator::new(backend, store.clone()),
            explain_client: ExplainClient::new(&config.explain),
            vision_client: VisionClient::new(&config.vision),
            store,
            config,
        }
    }
}

/// Build the full HTTP application: every route under `/api`, with CORS and request logging.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::predict::router(state.clone()))
        .merge(routes::explain::router(state.clone()))
        .merge(routes::extract::router(state.clone()))
        .merge(routes::history::router(state));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
