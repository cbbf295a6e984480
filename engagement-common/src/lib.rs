//! Engagement Predictor Common Types
//!
//! Wire types shared between the backend service and its clients.

pub mod explain;
pub mod prediction;
pub mod response;

pub use explain::{ExplainRequest, Explanation};
pub use prediction::{
    NewPrediction, PersistedPrediction, PredictionPayload, PredictionRequest, PredictionResult,
};
pub use response::{
    Acknowledgement, ExplainResponse, ExtractResponse, HistoryResponse, PredictResponse,
};
