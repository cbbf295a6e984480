use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use engagement_common::{ExplainRequest, ExplainResponse};

use crate::error::{Error, Result};
use crate::AppState;

/// POST /explain - language-model report for a completed prediction
async fn explain(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>> {
    let Json(request) = payload.map_err(|e| Error::Validation(e.body_text()))?;

    let has_platform = request
        .platform
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    let has_likes = request.likes.as_ref().is_some_and(|v| !v.is_null());
    if !has_platform || !has_likes {
        return Err(Error::Validation("Missing required prediction data".to_string()));
    }

    let explanation = state.explain_client.explain(&request).await?;

    Ok(Json(ExplainResponse {
        success: true,
        explanation,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/explain", post(explain))
        .with_state(state)
}
