//! Success envelopes returned by the HTTP API.

use serde::{Deserialize, Serialize};

use crate::{Explanation, PersistedPrediction, PredictionResult};

/// Response of `POST /api/predict`.
///
/// `id` is `null` when the prediction could not be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: PredictionResult,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub success: bool,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub data: Vec<PersistedPrediction>,
}

/// Bare `{"success": true}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_response_serializes_null_id() {
        let response = PredictResponse {
            success: true,
            prediction: PredictionResult {
                likes: 1.into(),
                comments: 0.into(),
                shares: 0.into(),
                clicks: 0.into(),
                timing_quality_score: serde_json::Number::from_f64(0.1).unwrap(),
            },
            id: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["id"].is_null());
        assert_eq!(json["success"], true);
    }
}
