//! Explanation request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Post details plus predicted metrics, as sent to the explain endpoint.
///
/// Numeric fields are kept as raw JSON so that whatever the client echoes back
/// from a prediction can be rendered without a second round of validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub post_time: Option<String>,
    #[serde(default)]
    pub followers: Option<Value>,
    #[serde(default)]
    pub ad_boost: Option<Value>,
    #[serde(default)]
    pub likes: Option<Value>,
    #[serde(default)]
    pub comments: Option<Value>,
    #[serde(default)]
    pub shares: Option<Value>,
    #[serde(default)]
    pub clicks: Option<Value>,
    #[serde(default)]
    pub timing_quality_score: Option<Value>,
}

impl ExplainRequest {
    /// Whether the ad boost flag is set (1, "1" or true).
    pub fn is_boosted(&self) -> bool {
        match &self.ad_boost {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => s.trim() == "1",
            _ => false,
        }
    }
}

/// Structured report produced by the language model.
///
/// The schema is owned by the prompt, so the object is kept as free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Explanation(pub Value);

impl Explanation {
    /// Report used when the model answers with something that is not a JSON object.
    pub fn fallback(raw: &str) -> Self {
        Self(json!({
            "overall_assessment": raw,
            "performance_level": "Moderate",
            "improvements": [],
        }))
    }

    pub fn empty() -> Self {
        Self(json!({}))
    }

    pub fn overall_assessment(&self) -> Option<&str> {
        self.0.get("overall_assessment").and_then(Value::as_str)
    }

    pub fn performance_level(&self) -> Option<&str> {
        self.0.get("performance_level").and_then(Value::as_str)
    }
}
