//! Queries over the `uploads` table, including the due-checkpoint and
//! label-eligibility scans that drive the tracker.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `uploads` table. Identity fields are immutable after
/// insertion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UploadRow {
    pub video_id: String,
    pub channel_id: String,
    pub bvid: String,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Insert an upload, ignoring the write if the video is already tracked.
/// Returns `true` if a new row was created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_upload(
    pool: &PgPool,
    video_id: &str,
    channel_id: &str,
    bvid: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO uploads (video_id, channel_id, bvid, uploaded_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (video_id) DO NOTHING",
    )
    .bind(video_id)
    .bind(channel_id)
    .bind(bvid)
    .bind(uploaded_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All tracked uploads, most recent first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_uploads(pool: &PgPool) -> Result<Vec<UploadRow>, DbError> {
    Ok(sqlx::query_as::<_, UploadRow>(
        "SELECT video_id, channel_id, bvid, uploaded_at, created_at \
         FROM uploads \
         ORDER BY uploaded_at DESC",
    )
    .fetch_all(pool)
    .await?)
}

/// Uploads whose checkpoint at `age_hours` has opened and that have no
/// performance row at exactly that age yet, oldest first.
///
/// The dual condition makes collection idempotent and resumable: re-running
/// after a partial failure only returns the genuinely missing checkpoints.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn due_for_checkpoint(pool: &PgPool, age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
    Ok(sqlx::query_as::<_, UploadRow>(
        "SELECT u.video_id, u.channel_id, u.bvid, u.uploaded_at, u.created_at \
         FROM uploads u \
         WHERE u.uploaded_at + make_interval(hours => $1) <= NOW() \
           AND NOT EXISTS ( \
             SELECT 1 FROM upload_performance up \
             WHERE up.upload_id = u.video_id AND up.checkpoint_hours = $1 \
           ) \
         ORDER BY u.uploaded_at",
    )
    .bind(age_hours)
    .fetch_all(pool)
    .await?)
}

/// Uploads with a performance row at age >= `min_age_hours` and no outcome
/// row yet, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn eligible_for_label(
    pool: &PgPool,
    min_age_hours: i32,
) -> Result<Vec<UploadRow>, DbError> {
    Ok(sqlx::query_as::<_, UploadRow>(
        "SELECT u.video_id, u.channel_id, u.bvid, u.uploaded_at, u.created_at \
         FROM uploads u \
         WHERE EXISTS ( \
             SELECT 1 FROM upload_performance up \
             WHERE up.upload_id = u.video_id AND up.checkpoint_hours >= $1 \
           ) \
           AND NOT EXISTS ( \
             SELECT 1 FROM upload_outcomes uo \
             WHERE uo.upload_id = u.video_id \
           ) \
         ORDER BY u.uploaded_at",
    )
    .bind(min_age_hours)
    .fetch_all(pool)
    .await?)
}

/// Uploads with a performance row at age >= `min_age_hours`, regardless of
/// whether an outcome exists. Powers the relabel sweep, which overwrites
/// outcomes using the current thresholds.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn eligible_for_relabel(
    pool: &PgPool,
    min_age_hours: i32,
) -> Result<Vec<UploadRow>, DbError> {
    Ok(sqlx::query_as::<_, UploadRow>(
        "SELECT u.video_id, u.channel_id, u.bvid, u.uploaded_at, u.created_at \
         FROM uploads u \
         WHERE EXISTS ( \
             SELECT 1 FROM upload_performance up \
             WHERE up.upload_id = u.video_id AND up.checkpoint_hours >= $1 \
           ) \
         ORDER BY u.uploaded_at",
    )
    .bind(min_age_hours)
    .fetch_all(pool)
    .await?)
}
