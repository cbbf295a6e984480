use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use engagement_common::ExtractResponse;

use crate::error::{Error, Result};
use crate::vision::is_allowed_mime_type;
use crate::AppState;

/// Room for multipart boundaries and part headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// POST /extract - read the text out of an uploaded image (multipart field "image")
async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractResponse>> {
    let mut multipart =
        multipart.map_err(|_| Error::Validation("No image file uploaded".to_string()))?;
    let max_bytes = state.config.vision.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let mime_type = field.content_type().unwrap_or_default().to_string();
        if !is_allowed_mime_type(&mime_type) {
            return Err(Error::Validation("Only image files allowed".to_string()));
        }

        let image = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;

        if image.is_empty() {
            break;
        }
        if image.len() > max_bytes {
            return Err(Error::Validation(format!(
                "Image exceeds the {} byte upload limit",
                max_bytes
            )));
        }

        let text = state.vision_client.extract_text(&image, &mime_type).await?;
        tracing::debug!("Extracted {} characters from {} upload", text.len(), mime_type);

        return Ok(Json(ExtractResponse {
            success: true,
            text,
        }));
    }

    Err(Error::Validation("No image file uploaded".to_string()))
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.vision.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/extract", post(extract))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
