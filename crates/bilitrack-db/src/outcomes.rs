//! Database operations for `upload_outcomes`: at most one row per upload,
//! holding the final label and the metrics snapshot that produced it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `upload_outcomes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutcomeRow {
    pub id: i64,
    pub upload_id: String,
    pub label: String,
    pub labeled_at: DateTime<Utc>,
    pub final_views: i64,
    pub final_engagement_rate: f64,
    pub final_coins: i64,
}

/// Insert payload for an outcome upsert.
#[derive(Debug, Clone)]
pub struct NewOutcome<'a> {
    pub upload_id: &'a str,
    pub label: &'a str,
    pub labeled_at: DateTime<Utc>,
    pub final_views: i64,
    pub final_engagement_rate: f64,
    pub final_coins: i64,
}

/// Upsert an outcome keyed by `upload_id`. Re-labeling overwrites the
/// existing row in place rather than appending a second one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_outcome(pool: &PgPool, outcome: &NewOutcome<'_>) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO upload_outcomes \
           (upload_id, label, labeled_at, final_views, final_engagement_rate, final_coins) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (upload_id) DO UPDATE SET \
           label = EXCLUDED.label, \
           labeled_at = EXCLUDED.labeled_at, \
           final_views = EXCLUDED.final_views, \
           final_engagement_rate = EXCLUDED.final_engagement_rate, \
           final_coins = EXCLUDED.final_coins \
         RETURNING id",
    )
    .bind(outcome.upload_id)
    .bind(outcome.label)
    .bind(outcome.labeled_at)
    .bind(outcome.final_views)
    .bind(outcome.final_engagement_rate)
    .bind(outcome.final_coins)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// The outcome row for an upload, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_outcome(pool: &PgPool, upload_id: &str) -> Result<Option<OutcomeRow>, DbError> {
    Ok(sqlx::query_as::<_, OutcomeRow>(
        "SELECT id, upload_id, label, labeled_at, final_views, final_engagement_rate, final_coins \
         FROM upload_outcomes \
         WHERE upload_id = $1",
    )
    .bind(upload_id)
    .fetch_optional(pool)
    .await?)
}

/// Count of outcome rows per label, for the stats summary.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_outcome_labels(pool: &PgPool) -> Result<Vec<(String, i64)>, DbError> {
    Ok(sqlx::query_as::<_, (String, i64)>(
        "SELECT label, COUNT(*) FROM upload_outcomes GROUP BY label ORDER BY label",
    )
    .fetch_all(pool)
    .await?)
}
