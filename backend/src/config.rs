//! Configuration for the engagement backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub explain: ExplainConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// External inference process configuration.
///
/// The process is launched as `<executable> <script_path> <model_path> <json_payload>`.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Interpreter or binary to launch (e.g., "python", "/opt/venv/bin/python").
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Inference script passed as the first argument.
    #[serde(default = "default_script_path")]
    pub script_path: String,
    /// Model artifact passed as the second argument.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Per-invocation timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Time between SIGTERM and SIGKILL when a timed-out process is terminated.
    #[serde(default = "default_kill_grace")]
    pub kill_grace_secs: u64,
    /// Maximum number of inference processes running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            script_path: default_script_path(),
            model_path: default_model_path(),
            timeout_secs: default_timeout(),
            kill_grace_secs: default_kill_grace(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite location, with or without a `sqlite:` prefix. `:memory:` is accepted.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Number of records returned by the history endpoint.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            history_limit: default_history_limit(),
        }
    }
}

/// OpenAI-compatible chat completion API used for explanations.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainConfig {
    #[serde(default = "default_explain_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_explain_model")]
    pub model: String,
    #[serde(default = "default_explain_temperature")]
    pub temperature: f32,
    #[serde(default = "default_explain_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            base_url: default_explain_url(),
            api_key: None,
            model: default_explain_model(),
            temperature: default_explain_temperature(),
            max_tokens: default_explain_max_tokens(),
        }
    }
}

/// Generative vision API used for image text extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_vision_model")]
    pub model: String,
    /// Largest accepted image upload in bytes.
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: default_vision_url(),
            api_key: None,
            model: default_vision_model(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_executable() -> String {
    "python".to_string()
}
fn default_script_path() -> String {
    "python/predict.py".to_string()
}
fn default_model_path() -> String {
    "SavedModels/Transformer.keras".to_string()
}
fn default_timeout() -> u64 {
    120
}
fn default_kill_grace() -> u64 {
    5
}
fn default_max_concurrent() -> usize {
    4
}
fn default_database_url() -> String {
    "sqlite:./data/predictions.db".to_string()
}
fn default_history_limit() -> usize {
    50
}
fn default_explain_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_explain_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_explain_temperature() -> f32 {
    0.4
}
fn default_explain_max_tokens() -> u32 {
    2048
}
fn default_vision_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_vision_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_max_upload() -> usize {
    10 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            inference: InferenceConfig::default(),
            database: DatabaseConfig::default(),
            explain: ExplainConfig::default(),
            vision: VisionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (ENGAGEMENT__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("api.host", default_host())?
            .set_default("api.port", default_port() as i64)?
            .set_default("inference.timeout_secs", default_timeout() as i64)?
            .set_default("inference.max_concurrent", default_max_concurrent() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("ENGAGEMENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_config() {
        let api = ApiConfig::default();
        assert_eq!(api.host, "0.0.0.0");
        assert_eq!(api.port, 5000);
    }

    #[test]
    fn test_default_inference_config() {
        let inference = InferenceConfig::default();
        assert_eq!(inference.executable, "python");
        assert_eq!(inference.script_path, "python/predict.py");
        assert_eq!(inference.model_path, "SavedModels/Transformer.keras");
        assert_eq!(inference.timeout_secs, 120);
        assert_eq!(inference.max_concurrent, 4);
    }

    #[test]
    fn test_default_upload_limit_is_ten_mib() {
        assert_eq!(VisionConfig::default().max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let loaded: Config = ConfigLoader::builder()
            .add_source(File::from_str(
                "[inference]\nexecutable = \"python3\"\ntimeout_secs = 0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(loaded.inference.executable, "python3");
        assert_eq!(loaded.inference.timeout_secs, 0);
        assert_eq!(loaded.inference.kill_grace_secs, 5);
        assert_eq!(loaded.database.history_limit, 50);
        assert_eq!(loaded.explain.model, "llama-3.3-70b-versatile");
        assert!(loaded.vision.api_key.is_none());
    }
}
