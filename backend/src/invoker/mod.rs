//! Inference invocation layer.
//!
//! This module defines the `InferenceBackend` trait: a narrow request/response
//! seam between the prediction orchestrator and whatever computes the numbers.
//! The only implementation today runs an external process per request, but an
//! in-process model or a network service can sit behind the same trait.

mod backend;
mod process;

pub use backend::{InferenceInvocation, ProcessBackend};
pub use process::ProcessInvoker;

use std::time::Duration;

use async_trait::async_trait;
use engagement_common::{PredictionPayload, PredictionResult};

/// Failures of a single inference invocation.
///
/// None of these are retried; each is local to the request that caused it.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The process exited with a non-zero status or was killed by a signal.
    #[error("Inference process exited with {}: {}", describe_code(*.code), .stderr)]
    ProcessFailure { code: Option<i32>, stderr: String },

    /// The process exited cleanly but its output is not a usable JSON result.
    #[error("Failed to parse inference output: {output}")]
    OutputDecodeFailure { output: String },

    /// The process reported an error in its JSON output.
    #[error("{0}")]
    ApplicationFailure(String),

    /// The process exceeded its time limit and was terminated.
    #[error("Inference process timed out after {0:?}")]
    Timeout(Duration),

    /// The process could not be started.
    #[error("Failed to start inference process: {0}")]
    Spawn(String),

    /// Collecting output or waiting for the process failed.
    #[error("Inference process I/O error: {0}")]
    Io(String),
}

impl InvokeError {
    /// Machine-readable classification, used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            InvokeError::ProcessFailure { .. } => "process_failure",
            InvokeError::OutputDecodeFailure { .. } => "output_decode_failure",
            InvokeError::ApplicationFailure(_) => "application_failure",
            InvokeError::Timeout(_) => "inference_timeout",
            InvokeError::Spawn(_) | InvokeError::Io(_) => "invocation_error",
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Primary trait for inference backends.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Short identifier for logs (e.g., "process").
    fn backend_type(&self) -> &'static str;

    /// Run one prediction for an already validated payload.
    async fn predict(
        &self,
        payload: &PredictionPayload,
    ) -> std::result::Result<PredictionResult, InvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failure_message_includes_stderr() {
        let err = InvokeError::ProcessFailure {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code 1"));
        assert!(msg.contains("boom"));
        assert_eq!(err.kind(), "process_failure");
    }

    #[test]
    fn test_signal_termination_message() {
        let err = InvokeError::ProcessFailure {
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_application_failure_message_is_verbatim() {
        let err = InvokeError::ApplicationFailure("bad model input".to_string());
        assert_eq!(err.to_string(), "bad model input");
        assert_eq!(err.kind(), "application_failure");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            InvokeError::OutputDecodeFailure { output: String::new() }.kind(),
            InvokeError::Timeout(Duration::from_secs(1)).kind(),
            InvokeError::Spawn(String::new()).kind(),
        ];
        assert_eq!(kinds, ["output_decode_failure", "inference_timeout", "invocation_error"]);
    }
}
