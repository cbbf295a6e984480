//! Error types for the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::invoker::InvokeError;
use crate::llm::ExplainError;
use crate::store::StoreError;
use crate::vision::VisionError;

/// Errors surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed request fields. Detected before any work is done.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Invocation(#[from] InvokeError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An external API (language model, vision) failed.
    #[error("{0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status and machine-readable kind for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Error::Invocation(e @ InvokeError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, e.kind()),
            Error::Invocation(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.kind()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<ExplainError> for Error {
    fn from(e: ExplainError) -> Self {
        match e {
            ExplainError::NotConfigured => Error::Internal(e.to_string()),
            other => Error::Upstream(other.to_string()),
        }
    }
}

impl From<VisionError> for Error {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::NotConfigured => Error::Internal(e.to_string()),
            other => Error::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();

        if status.is_server_error() {
            tracing::error!(kind, "Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_validation_is_client_error() {
        let (status, kind) = Error::Validation("Missing required fields".to_string()).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(kind, "validation_error");
    }

    #[test]
    fn test_invocation_failures_are_server_errors() {
        let err: Error = InvokeError::ProcessFailure {
            code: Some(1),
            stderr: "boom".to_string(),
        }
        .into();
        assert_eq!(err.classify(), (StatusCode::INTERNAL_SERVER_ERROR, "process_failure"));
        assert!(err.to_string().contains("boom"));

        let err: Error = InvokeError::OutputDecodeFailure {
            output: "not json".to_string(),
        }
        .into();
        assert_eq!(err.classify(), (StatusCode::INTERNAL_SERVER_ERROR, "output_decode_failure"));

        let err: Error = InvokeError::ApplicationFailure("bad model input".to_string()).into();
        assert_eq!(err.classify(), (StatusCode::INTERNAL_SERVER_ERROR, "application_failure"));
        assert_eq!(err.to_string(), "bad model input");
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let err: Error = InvokeError::Timeout(Duration::from_secs(120)).into();
        assert_eq!(err.classify(), (StatusCode::GATEWAY_TIMEOUT, "inference_timeout"));
    }

    #[test]
    fn test_unconfigured_upstream_is_internal() {
        let err: Error = ExplainError::NotConfigured.into();
        assert_eq!(err.classify().1, "internal_error");

        let err: Error = VisionError::NoCandidates.into();
        assert_eq!(err.classify(), (StatusCode::BAD_GATEWAY, "upstream_error"));
    }
}
