//! Prediction request, payload and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Prediction request as received from a client.
///
/// Every field is optional at the wire level so that validation can report
/// which required field is missing instead of failing deserialization.
/// `followers` and `ad_boost` stay loosely typed because clients send them as
/// numbers, booleans or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
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
}

/// Validated and coerced request, in the exact shape handed to the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub caption: String,
    pub content: String,
    pub platform: String,
    pub post_date: String,
    pub post_time: String,
    pub followers: f64,
    /// 0 or 1.
    pub ad_boost: u8,
}

/// Predicted engagement metrics for one post.
///
/// Numbers are kept exactly as the inference engine printed them, so `120`
/// is echoed back as `120` and not `120.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub likes: Number,
    pub comments: Number,
    pub shares: Number,
    pub clicks: Number,
    /// Quality of the chosen posting time, in [0, 1].
    pub timing_quality_score: Number,
}

/// A completed prediction ready to be stored: the payload merged with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    #[serde(flatten)]
    pub payload: PredictionPayload,
    #[serde(flatten)]
    pub result: PredictionResult,
    pub created_at: DateTime<Utc>,
}

impl NewPrediction {
    pub fn new(payload: PredictionPayload, result: PredictionResult) -> Self {
        Self {
            payload,
            result,
            created_at: Utc::now(),
        }
    }
}

/// A stored prediction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPrediction {
    pub id: String,
    #[serde(flatten)]
    pub record: NewPrediction,
}
