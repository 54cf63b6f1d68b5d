use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};

use shared::ClassificationResult;

/// History timestamps are stored in UTC and rendered in Jakarta time
/// (UTC+7, no daylight saving) for the listing.
const DISPLAY_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, FromRow)]
struct HistoryRow {
    id: i32,
    filename: String,
    classification: String,
    accuracy: f32,
    dryness_level: i32,
    is_banana: bool,
    created_at: DateTime<Utc>,
}

/// One past classification, as served by the history listing.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: i32,
    pub filename: String,
    pub classification: String,
    pub accuracy: f32,
    #[serde(rename = "drynessLevel")]
    pub dryness_level: i32,
    pub is_banana: bool,
    pub created_at: String,
}

impl From<HistoryRow> for HistoryRecord {
    fn from(row: HistoryRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            classification: row.classification,
            accuracy: row.accuracy,
            dryness_level: row.dryness_level,
            is_banana: row.is_banana,
            created_at: format_display_time(row.created_at),
        }
    }
}

fn format_display_time(timestamp: DateTime<Utc>) -> String {
    let jakarta = FixedOffset::east_opt(DISPLAY_OFFSET_SECS).unwrap();
    timestamp
        .with_timezone(&jakarta)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Append-only store of past classification outcomes.
///
/// The pool is cheap to clone, so the repository is passed around
/// between handlers by value.
#[derive(Clone)]
pub struct HistoryRepository {
    pool: MySqlPool,
}

impl HistoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert one record; the store assigns `id` and `created_at`.
    pub async fn append(&self, result: &ClassificationResult) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO history (filename, classification, accuracy, dryness_level, is_banana) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&result.filename)
        .bind(&result.classification)
        .bind(result.accuracy)
        .bind(result.dryness_level)
        .bind(result.is_banana)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT id, filename, classification, accuracy, dryness_level, is_banana, created_at \
             FROM history ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }
}
