//! Prediction persistence.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use engagement_common::{NewPrediction, PersistedPrediction};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Storage for completed predictions.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Store one record and return its generated identifier.
    async fn insert(&self, record: &NewPrediction) -> Result<String, StoreError>;

    /// Most recent records first.
    async fn recent(&self, limit: usize) -> Result<Vec<PersistedPrediction>, StoreError>;

    /// Delete a record. Returns `false` when no record had this id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
