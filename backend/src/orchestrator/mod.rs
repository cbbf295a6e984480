//! Prediction orchestration.
//!
//! Validates a request, runs exactly one inference, and stores the merged
//! record on a best-effort basis: a storage failure never turns a successful
//! prediction into an error response.

mod validate;

pub use validate::validate;

use std::sync::Arc;
use std::time::Instant;

use engagement_common::{NewPrediction, PredictionRequest, PredictionResult};

use crate::error::Result;
use crate::invoker::InferenceBackend;
use crate::store::PredictionStore;

/// Result of a successful prediction.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub prediction: PredictionResult,
    /// Identifier of the stored record, `None` if storing failed.
    pub id: Option<String>,
}

pub struct PredictionOrchestrator {
    backend: Arc<dyn InferenceBackend>,
    store: Arc<dyn PredictionStore>,
}

impl PredictionOrchestrator {
    pub fn new(backend: Arc<dyn InferenceBackend>, store: Arc<dyn PredictionStore>) -> Self {
        Self { backend, store }
    }

    pub async fn predict(&self, request: PredictionRequest) -> Result<PredictionOutcome> {
        let payload = validate(request)?;
        let start = Instant::now();

        let prediction = self.backend.predict(&payload).await.map_err(|e| {
            tracing::warn!(
                backend = self.backend.backend_type(),
                kind = e.kind(),
                "Prediction failed: {}",
                e
            );
            e
        })?;

        tracing::info!(
            backend = self.backend.backend_type(),
            platform = %payload.platform,
            latency_ms = start.elapsed().as_millis() as u64,
            "Prediction completed"
        );

        let record = NewPrediction::new(payload, prediction.clone());
        let id = match self.store.insert(&record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to store prediction: {}", e);
                None
            }
        };

        Ok(PredictionOutcome { prediction, id })
    }
}
