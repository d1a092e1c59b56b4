//! Database operations for the monitored-channel registry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `channels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelRow {
    pub uid: String,
    pub name: String,
    pub description: String,
    pub follower_count: i64,
    pub video_count: i64,
    pub added_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Insert payload for a channel upsert.
#[derive(Debug, Clone)]
pub struct NewChannel<'a> {
    pub uid: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub follower_count: i64,
    pub video_count: i64,
}

/// Upsert a channel keyed by `uid`. Counters are overwritten; re-adding a
/// deactivated channel reactivates it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_channel(pool: &PgPool, channel: &NewChannel<'_>) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channels (uid, name, description, follower_count, video_count) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (uid) DO UPDATE SET \
           name = CASE WHEN EXCLUDED.name <> '' THEN EXCLUDED.name ELSE channels.name END, \
           description = CASE WHEN EXCLUDED.description <> '' \
                              THEN EXCLUDED.description ELSE channels.description END, \
           follower_count = EXCLUDED.follower_count, \
           video_count = EXCLUDED.video_count, \
           is_active = TRUE",
    )
    .bind(channel.uid)
    .bind(channel.name)
    .bind(channel.description)
    .bind(channel.follower_count)
    .bind(channel.video_count)
    .execute(pool)
    .await?;

    Ok(())
}

/// Channels in insertion order, optionally restricted to active ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_channels(pool: &PgPool, active_only: bool) -> Result<Vec<ChannelRow>, DbError> {
    let sql = if active_only {
        "SELECT uid, name, description, follower_count, video_count, added_at, is_active \
         FROM channels WHERE is_active = TRUE ORDER BY added_at"
    } else {
        "SELECT uid, name, description, follower_count, video_count, added_at, is_active \
         FROM channels ORDER BY added_at"
    };

    Ok(sqlx::query_as::<_, ChannelRow>(sql).fetch_all(pool).await?)
}

/// Mark a channel inactive so scans skip it. Returns `true` if a row changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_channel(pool: &PgPool, uid: &str) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE channels SET is_active = FALSE WHERE uid = $1")
        .bind(uid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Upsert channels from the YAML config into the database.
///
/// Returns the number of channels processed. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_channels(
    pool: &PgPool,
    channels: &[bilitrack_core::ChannelConfig],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for channel in channels {
        sqlx::query(
            "INSERT INTO channels (uid, name) \
             VALUES ($1, $2) \
             ON CONFLICT (uid) DO UPDATE SET \
               name = CASE WHEN EXCLUDED.name <> '' THEN EXCLUDED.name ELSE channels.name END, \
               is_active = TRUE",
        )
        .bind(&channel.uid)
        .bind(&channel.name)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
