//! Language-model explanations for predictions.

mod explain;
mod prompt;

pub use explain::{ExplainClient, ExplainError};
