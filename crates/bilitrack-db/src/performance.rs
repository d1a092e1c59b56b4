//! Database operations for `upload_performance`: one row per
//! (upload, checkpoint age), overwritten in place on re-collection.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `upload_performance` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PerformanceRow {
    pub id: i64,
    pub upload_id: String,
    pub checkpoint_hours: i32,
    pub recorded_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub coins: i64,
    pub favorites: i64,
    pub shares: i64,
    pub danmaku: i64,
    pub comments: i64,
    pub view_velocity: f64,
    pub engagement_rate: f64,
}

/// Insert payload for a performance upsert.
#[derive(Debug, Clone)]
pub struct NewPerformance<'a> {
    pub upload_id: &'a str,
    pub checkpoint_hours: i32,
    pub recorded_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub coins: i64,
    pub favorites: i64,
    pub shares: i64,
    pub danmaku: i64,
    pub comments: i64,
    pub view_velocity: f64,
    pub engagement_rate: f64,
}

/// Averages over each upload's latest checkpoint row, for the stats summary.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct PerformanceAverages {
    pub avg_views: f64,
    pub avg_likes: f64,
    pub avg_coins: f64,
    pub avg_engagement_rate: f64,
}

/// Upsert a performance row keyed by (`upload_id`, `checkpoint_hours`).
///
/// On conflict every numeric field and `recorded_at` are overwritten so the
/// row always reflects the most recent collection attempt at that age, not
/// the first. Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_performance(
    pool: &PgPool,
    perf: &NewPerformance<'_>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO upload_performance \
           (upload_id, checkpoint_hours, recorded_at, views, likes, coins, \
            favorites, shares, danmaku, comments, view_velocity, engagement_rate) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (upload_id, checkpoint_hours) DO UPDATE SET \
           recorded_at = EXCLUDED.recorded_at, \
           views = EXCLUDED.views, \
           likes = EXCLUDED.likes, \
           coins = EXCLUDED.coins, \
           favorites = EXCLUDED.favorites, \
           shares = EXCLUDED.shares, \
           danmaku = EXCLUDED.danmaku, \
           comments = EXCLUDED.comments, \
           view_velocity = EXCLUDED.view_velocity, \
           engagement_rate = EXCLUDED.engagement_rate \
         RETURNING id",
    )
    .bind(perf.upload_id)
    .bind(perf.checkpoint_hours)
    .bind(perf.recorded_at)
    .bind(perf.views)
    .bind(perf.likes)
    .bind(perf.coins)
    .bind(perf.favorites)
    .bind(perf.shares)
    .bind(perf.danmaku)
    .bind(perf.comments)
    .bind(perf.view_velocity)
    .bind(perf.engagement_rate)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// The performance row with the greatest checkpoint age for an upload.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_performance(
    pool: &PgPool,
    upload_id: &str,
) -> Result<Option<PerformanceRow>, DbError> {
    Ok(sqlx::query_as::<_, PerformanceRow>(
        "SELECT id, upload_id, checkpoint_hours, recorded_at, views, likes, coins, \
                favorites, shares, danmaku, comments, view_velocity, engagement_rate \
         FROM upload_performance \
         WHERE upload_id = $1 \
         ORDER BY checkpoint_hours DESC \
         LIMIT 1",
    )
    .bind(upload_id)
    .fetch_optional(pool)
    .await?)
}

/// Averages across each upload's latest checkpoint row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_performance_averages(pool: &PgPool) -> Result<PerformanceAverages, DbError> {
    let row = sqlx::query_as::<_, PerformanceAverages>(
        "SELECT COALESCE(AVG(views::double precision), 0)  AS avg_views, \
                COALESCE(AVG(likes::double precision), 0)  AS avg_likes, \
                COALESCE(AVG(coins::double precision), 0)  AS avg_coins, \
                COALESCE(AVG(engagement_rate), 0)          AS avg_engagement_rate \
         FROM upload_performance \
         WHERE (upload_id, checkpoint_hours) IN ( \
             SELECT upload_id, MAX(checkpoint_hours) \
             FROM upload_performance \
             GROUP BY upload_id \
           )",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
