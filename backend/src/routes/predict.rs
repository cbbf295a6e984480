use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use engagement_common::{PredictResponse, PredictionRequest};

use crate::error::{Error, Result};
use crate::AppState;

/// POST /predict - run one engagement prediction
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(request) = payload.map_err(|e| Error::Validation(e.body_text()))?;

    let outcome = state.orchestrator.predict(request).await?;

    Ok(Json(PredictResponse {
        success: true,
        prediction: outcome.prediction,
        id: outcome.id,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .with_state(state)
}
