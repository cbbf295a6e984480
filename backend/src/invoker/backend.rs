//! Process-backed inference backend.

use async_trait::async_trait;
use engagement_common::{PredictionPayload, PredictionResult};

use super::{InferenceBackend, InvokeError, ProcessInvoker};
use crate::config::InferenceConfig;

/// Everything needed to launch one inference process.
///
/// Built per request and dropped once the process has exited.
#[derive(Debug, Clone)]
pub struct InferenceInvocation {
    executable: String,
    script_path: String,
    model_path: String,
    payload: String,
}

impl InferenceInvocation {
    pub fn new(config: &InferenceConfig, payload: &PredictionPayload) -> Result<Self, InvokeError> {
        let payload = serde_json::to_string(payload)
            .map_err(|e| InvokeError::Io(format!("Failed to encode payload: {}", e)))?;
        Ok(Self {
            executable: config.executable.clone(),
            script_path: config.script_path.clone(),
            model_path: config.model_path.clone(),
            payload,
        })
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Positional arguments: script, model artifact, JSON payload.
    pub fn args(&self) -> [&str; 3] {
        [
            self.script_path.as_str(),
            self.model_path.as_str(),
            self.payload.as_str(),
        ]
    }
}

/// Runs the inference script as a child process for every prediction.
pub struct ProcessBackend {
    config: InferenceConfig,
    invoker: ProcessInvoker,
}

impl ProcessBackend {
    pub fn new(config: InferenceConfig) -> Self {
        let invoker = ProcessInvoker::from_config(&config);
        Self { config, invoker }
    }
}

#[async_trait]
impl InferenceBackend for ProcessBackend {
    fn backend_type(&self) -> &'static str {
        "process"
    }

    async fn predict(&self, payload: &PredictionPayload) -> Result<PredictionResult, InvokeError> {
        let invocation = InferenceInvocation::new(&self.config, payload)?;

        tracing::debug!(
            "Invoking {} {} for platform {}",
            invocation.executable(),
            self.config.script_path,
            payload.platform
        );

        let value = self
            .invoker
            .run(invocation.executable(), &invocation.args())
            .await?;

        serde_json::from_value(value.clone()).map_err(|e| {
            tracing::warn!("Inference output is missing prediction fields: {}", e);
            InvokeError::OutputDecodeFailure {
                output: value.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> PredictionPayload {
        PredictionPayload {
            caption: "New arrivals".to_string(),
            content: "Batik sarees".to_string(),
            platform: "Instagram".to_string(),
            post_date: "2025-03-01".to_string(),
            post_time: "18:00".to_string(),
            followers: 2500.0,
            ad_boost: 0,
        }
    }

    #[test]
    fn test_invocation_args_order() {
        let config = InferenceConfig {
            executable: "python3".to_string(),
            script_path: "python/predict.py".to_string(),
            model_path: "SavedModels/Transformer.keras".to_string(),
            ..InferenceConfig::default()
        };
        let invocation = InferenceInvocation::new(&config, &payload()).unwrap();
        let args = invocation.args();

        assert_eq!(invocation.executable(), "python3");
        assert_eq!(args[0], "python/predict.py");
        assert_eq!(args[1], "SavedModels/Transformer.keras");

        let sent: serde_json::Value = serde_json::from_str(args[2]).unwrap();
        assert_eq!(sent["platform"], "Instagram");
        assert_eq!(sent["followers"], 2500.0);
        assert_eq!(sent["ad_boost"], 0);
        assert_eq!(sent["caption"], "New arrivals");
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::io::Write;
        use tempfile::NamedTempFile;

        fn script(body: &str) -> NamedTempFile {
            let mut file = NamedTempFile::new().unwrap();
            writeln!(file, "{}", body).unwrap();
            file
        }

        fn backend_for(script: &NamedTempFile) -> ProcessBackend {
            ProcessBackend::new(InferenceConfig {
                executable: "sh".to_string(),
                script_path: script.path().display().to_string(),
                model_path: "model.keras".to_string(),
                timeout_secs: 10,
                ..InferenceConfig::default()
            })
        }

        #[tokio::test]
        async fn test_predict_decodes_result() {
            let file = script(
                r#"echo '{"likes":120,"comments":5,"shares":3,"clicks":40,"timing_quality_score":0.82}'"#,
            );
            let result = backend_for(&file).predict(&payload()).await.unwrap();
            assert_eq!(result.likes, serde_json::Number::from(120));
            assert_eq!(result.clicks, serde_json::Number::from(40));
            assert_eq!(result.timing_quality_score.as_f64(), Some(0.82));
            assert_eq!(
                serde_json::to_string(&result).unwrap(),
                r#"{"likes":120,"comments":5,"shares":3,"clicks":40,"timing_quality_score":0.82}"#
            );
        }

        #[tokio::test]
        async fn test_predict_receives_model_path() {
            // Echo the model argument back through the error channel
            let file = script(r#"echo "{\"error\":\"model=$1\"}""#);
            match backend_for(&file).predict(&payload()).await {
                Err(InvokeError::ApplicationFailure(msg)) => assert_eq!(msg, "model=model.keras"),
                other => panic!("Expected ApplicationFailure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_predict_missing_fields_is_decode_failure() {
            let file = script(r#"echo '{"likes":1}'"#);
            match backend_for(&file).predict(&payload()).await {
                Err(InvokeError::OutputDecodeFailure { output }) => {
                    assert!(output.contains("likes"));
                }
                other => panic!("Expected OutputDecodeFailure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_predict_is_repeatable() {
            let file = script(
                r#"echo '{"likes":10.5,"comments":1.25,"shares":0,"clicks":7,"timing_quality_score":0.3333}'"#,
            );
            let backend = backend_for(&file);
            let first = backend.predict(&payload()).await.unwrap();
            let second = backend.predict(&payload()).await.unwrap();
            assert_eq!(
                serde_json::to_vec(&first).unwrap(),
                serde_json::to_vec(&second).unwrap()
            );
        }
    }
}
