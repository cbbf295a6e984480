//! Test doubles and fixtures shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use engagement_common::{
    NewPrediction, PersistedPrediction, PredictionPayload, PredictionRequest, PredictionResult,
};
use serde_json::json;

use crate::config::{Config, DatabaseConfig, InferenceConfig, LoggingConfig};
use crate::invoker::{InferenceBackend, InvokeError};
use crate::store::{PredictionStore, StoreError};
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        inference: InferenceConfig {
            executable: "sh".to_string(),
            script_path: "/nonexistent/predict.sh".to_string(),
            model_path: "/nonexistent/model.keras".to_string(),
            timeout_secs: 10,
            kill_grace_secs: 1,
            max_concurrent: 2,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
            history_limit: 50,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        ..Config::default()
    }
}

pub fn create_test_state(
    config: Config,
    backend: Arc<dyn InferenceBackend>,
    store: Arc<dyn PredictionStore>,
) -> Arc<AppState> {
    Arc::new(AppState::new(config, backend, store))
}

/// A complete, valid prediction request.
pub fn sample_request() -> PredictionRequest {
    PredictionRequest {
        caption: Some("Avurudu sale starts today".to_string()),
        content: Some("Image of festive sweets".to_string()),
        platform: Some("Facebook".to_string()),
        post_date: Some("2025-04-12".to_string()),
        post_time: Some("18:30".to_string()),
        followers: Some(json!(1500)),
        ad_boost: Some(json!(1)),
    }
}

/// The metrics every fake inference engine in the tests prints.
pub fn sample_result() -> PredictionResult {
    serde_json::from_value(json!({
        "likes": 120,
        "comments": 5,
        "shares": 3,
        "clicks": 40,
        "timing_quality_score": 0.82
    }))
    .expect("sample result is valid")
}

/// Backend that returns a fixed outcome and counts calls.
pub struct StubBackend {
    outcome: Result<PredictionResult, fn() -> InvokeError>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn succeeding(result: PredictionResult) -> Self {
        Self {
            outcome: Ok(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: fn() -> InvokeError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    fn backend_type(&self) -> &'static str {
        "stub"
    }

    async fn predict(&self, _payload: &PredictionPayload) -> Result<PredictionResult, InvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(result) => Ok(result.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

/// In-memory store that records every insert, optionally failing them.
pub struct RecordingStore {
    fail_inserts: bool,
    attempts: AtomicUsize,
    records: Mutex<Vec<PersistedPrediction>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            fail_inserts: false,
            attempts: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Self::new()
        }
    }

    pub fn insert_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn inserted(&self) -> Vec<NewPrediction> {
        self.records
            .lock()
            .expect("records lock poisoned")
            .iter()
            .map(|r| r.record.clone())
            .collect()
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictionStore for RecordingStore {
    async fn insert(&self, record: &NewPrediction) -> Result<String, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts {
            return Err(StoreError::DatabaseError("database is locked".to_string()));
        }

        let mut records = self.records.lock().expect("records lock poisoned");
        let id = format!("rec-{}", records.len() + 1);
        records.push(PersistedPrediction {
            id: id.clone(),
            record: record.clone(),
        });
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PersistedPrediction>, StoreError> {
        let records = self.records.lock().expect("records lock poisoned");
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().expect("records lock poisoned");
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
