use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use engagement_common::{Acknowledgement, HistoryResponse};

use crate::error::{Error, Result};
use crate::AppState;

/// GET /history - most recent stored predictions
async fn list_history(State(state): State<Arc<AppState>>) -> Result<Json<HistoryResponse>> {
    let data = state
        .store
        .recent(state.config.database.history_limit)
        .await?;

    Ok(Json(HistoryResponse {
        success: true,
        data,
    }))
}

/// DELETE /history/:id
async fn delete_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Acknowledgement>> {
    if !state.store.delete(&id).await? {
        return Err(Error::NotFound(format!("Prediction {}", id)));
    }

    tracing::info!("Deleted prediction {}", id);
    Ok(Json(Acknowledgement { success: true }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:id", delete(delete_history))
        .with_state(state)
}
