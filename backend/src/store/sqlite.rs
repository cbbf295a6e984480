use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use engagement_common::{NewPrediction, PersistedPrediction, PredictionPayload, PredictionResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, Row};
use serde_json::Number;

use super::{PredictionStore, StoreError};

/// SQLite-backed prediction store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            // Create parent directories if needed
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path)
        }
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        // Metric columns are untyped so integers and reals keep their storage class
        conn.execute(
            "CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                caption TEXT NOT NULL,
                content TEXT NOT NULL,
                platform TEXT NOT NULL,
                post_date TEXT NOT NULL,
                post_time TEXT NOT NULL,
                followers REAL NOT NULL,
                ad_boost INTEGER NOT NULL,
                likes NOT NULL,
                comments NOT NULL,
                shares NOT NULL,
                clicks NOT NULL,
                timing_quality_score NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_predictions_created_at ON predictions(created_at)",
            [],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::info!("Prediction store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_prediction(row: &Row<'_>) -> rusqlite::Result<PersistedPrediction> {
        let created_at: String = row.get(13)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(PersistedPrediction {
            id: row.get(0)?,
            record: NewPrediction {
                payload: PredictionPayload {
                    caption: row.get(1)?,
                    content: row.get(2)?,
                    platform: row.get(3)?,
                    post_date: row.get(4)?,
                    post_time: row.get(5)?,
                    followers: row.get(6)?,
                    ad_boost: row.get(7)?,
                },
                result: PredictionResult {
                    likes: metric(row, 8)?,
                    comments: metric(row, 9)?,
                    shares: metric(row, 10)?,
                    clicks: metric(row, 11)?,
                    timing_quality_score: metric(row, 12)?,
                },
                created_at,
            },
        })
    }
}

/// Integers stay integers so history shows metrics the way they were predicted.
fn to_sql_number(number: &Number) -> SqlValue {
    match number.as_i64() {
        Some(i) => SqlValue::Integer(i),
        None => SqlValue::Real(number.as_f64().unwrap_or_default()),
    }
}

fn metric(row: &Row<'_>, idx: usize) -> rusqlite::Result<Number> {
    let number = match row.get::<_, SqlValue>(idx)? {
        SqlValue::Integer(i) => Some(Number::from(i)),
        SqlValue::Real(f) => Number::from_f64(f),
        _ => None,
    };
    number.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "metric".to_string(),
        rusqlite::types::Type::Null,
    ))
}

#[async_trait]
impl PredictionStore for SqliteStore {
    async fn insert(&self, record: &NewPrediction) -> Result<String, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let payload = &record.payload;
        let result = &record.result;

        conn.execute(
            "INSERT INTO predictions (
                id, caption, content, platform, post_date, post_time, followers, ad_boost,
                likes, comments, shares, clicks, timing_quality_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                id,
                payload.caption,
                payload.content,
                payload.platform,
                payload.post_date,
                payload.post_time,
                payload.followers,
                payload.ad_boost,
                to_sql_number(&result.likes),
                to_sql_number(&result.comments),
                to_sql_number(&result.shares),
                to_sql_number(&result.clicks),
                to_sql_number(&result.timing_quality_score),
                record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::debug!("Stored prediction: {}", id);
        Ok(id)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<PersistedPrediction>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, caption, content, platform, post_date, post_time, followers, ad_boost,
                        likes, comments, shares, clicks, timing_quality_score, created_at
                 FROM predictions
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_prediction)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let removed = conn
            .execute("DELETE FROM predictions WHERE id = ?1", params![id])
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(platform: &str, likes: u64, created_at: DateTime<Utc>) -> NewPrediction {
        NewPrediction {
            payload: PredictionPayload {
                caption: "caption".to_string(),
                content: String::new(),
                platform: platform.to_string(),
                post_date: "2025-01-15".to_string(),
                post_time: "09:00".to_string(),
                followers: 800.0,
                ad_boost: 1,
            },
            result: PredictionResult {
                likes: likes.into(),
                comments: 2.into(),
                shares: 1.into(),
                clicks: Number::from_f64(9.5).unwrap(),
                timing_quality_score: Number::from_f64(0.61).unwrap(),
            },
            created_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let store = SqliteStore::new(":memory:").unwrap();
        let original = record("TikTok", 42, Utc::now());

        let id = store.insert(&original).await.unwrap();
        let rows = store.recent(10).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].record.payload, original.payload);
        assert_eq!(rows[0].record.result, original.result);
        // Stored with microsecond precision
        let drift = (rows[0].record.created_at - original.created_at).num_microseconds().unwrap();
        assert!(drift.abs() <= 1);
    }

    #[tokio::test]
    async fn test_metrics_keep_integer_and_float_form() {
        let store = SqliteStore::new(":memory:").unwrap();
        let mut original = record("Facebook", 120, Utc::now());
        original.result.comments = Number::from_f64(5.0).unwrap();

        store.insert(&original).await.unwrap();
        let rows = store.recent(1).await.unwrap();

        assert_eq!(rows[0].record.result, original.result);
        assert_eq!(
            serde_json::to_string(&rows[0].record.result).unwrap(),
            r#"{"likes":120,"comments":5.0,"shares":1,"clicks":9.5,"timing_quality_score":0.61}"#
        );
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let store = SqliteStore::new("sqlite::memory:").unwrap();
        let now = Utc::now();
        store.insert(&record("Facebook", 1, now - Duration::minutes(2))).await.unwrap();
        store.insert(&record("Instagram", 2, now)).await.unwrap();
        store.insert(&record("TikTok", 3, now - Duration::minutes(1))).await.unwrap();

        let rows = store.recent(2).await.unwrap();
        let platforms: Vec<&str> = rows.iter().map(|r| r.record.payload.platform.as_str()).collect();
        assert_eq!(platforms, vec!["Instagram", "TikTok"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteStore::new(":memory:").unwrap();
        let id = store.insert(&record("Facebook", 1, Utc::now())).await.unwrap();

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(store.recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/predictions.db");
        let url = format!("sqlite:{}", path.display());

        let store = SqliteStore::new(&url).unwrap();
        store.insert(&record("Facebook", 1, Utc::now())).await.unwrap();
        assert!(path.exists());
    }
}
