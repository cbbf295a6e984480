use engagement_common::{ExplainRequest, Explanation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::config::ExplainConfig;

/// Client for an OpenAI-compatible chat completion API.
pub struct ExplainClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("Explanation API key is not configured")]
    NotConfigured,
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Explanation API error: {0}")]
    Upstream(String),
}

impl ExplainClient {
    pub fn new(config: &ExplainConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Ask the model for an explainability report on one prediction.
    pub async fn explain(&self, request: &ExplainRequest) -> Result<Explanation, ExplainError> {
        let api_key = self.api_key.as_deref().ok_or(ExplainError::NotConfigured)?;

        let prompt = user_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!("Sending explanation request to {} (model: {})", url, self.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExplainError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExplainError::Upstream(format!("{}: {}", status, body)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExplainError::InvalidResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(parse_explanation(&content))
    }
}

/// Decode the model's answer, falling back to wrapping raw text.
fn parse_explanation(content: &str) -> Explanation {
    if content.trim().is_empty() {
        return Explanation::empty();
    }

    match serde_json::from_str::<Value>(content) {
        Ok(value) if value.is_object() => Explanation(value),
        _ => {
            tracing::debug!("Model returned non-JSON explanation, wrapping raw text");
            Explanation::fallback(content)
        }
    }
}
