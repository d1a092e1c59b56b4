//! Database operations for `channel_videos`: point-in-time snapshots of
//! videos scanned from monitored channels.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `channel_videos` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelVideoRow {
    pub bvid: String,
    pub uid: String,
    pub title: String,
    pub description: String,
    pub duration_secs: i64,
    pub views: i64,
    pub likes: i64,
    pub coins: i64,
    pub favorites: i64,
    pub shares: i64,
    pub danmaku: i64,
    pub comments: i64,
    pub publish_time: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub youtube_source_id: Option<String>,
    pub label: Option<String>,
}

/// Insert payload for a channel-video upsert.
#[derive(Debug, Clone)]
pub struct NewChannelVideo<'a> {
    pub bvid: &'a str,
    pub uid: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub duration_secs: i64,
    pub views: i64,
    pub likes: i64,
    pub coins: i64,
    pub favorites: i64,
    pub shares: i64,
    pub danmaku: i64,
    pub comments: i64,
    pub publish_time: Option<DateTime<Utc>>,
    pub collected_at: DateTime<Utc>,
    pub youtube_source_id: Option<&'a str>,
}

/// Optional filters for [`list_channel_videos`].
#[derive(Debug, Clone, Default)]
pub struct ChannelVideoFilter<'a> {
    pub uid: Option<&'a str>,
    pub label: Option<&'a str>,
    pub limit: i64,
}

/// Upsert a channel video keyed by `bvid`. Counters and `collected_at` are
/// overwritten on re-scan; `youtube_source_id` and `label` keep their
/// existing value when the new one is NULL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_channel_video(
    pool: &PgPool,
    video: &NewChannelVideo<'_>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channel_videos \
           (bvid, uid, title, description, duration_secs, views, likes, coins, \
            favorites, shares, danmaku, comments, publish_time, collected_at, \
            youtube_source_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (bvid) DO UPDATE SET \
           title = EXCLUDED.title, \
           description = EXCLUDED.description, \
           duration_secs = EXCLUDED.duration_secs, \
           views = EXCLUDED.views, \
           likes = EXCLUDED.likes, \
           coins = EXCLUDED.coins, \
           favorites = EXCLUDED.favorites, \
           shares = EXCLUDED.shares, \
           danmaku = EXCLUDED.danmaku, \
           comments = EXCLUDED.comments, \
           publish_time = COALESCE(EXCLUDED.publish_time, channel_videos.publish_time), \
           collected_at = EXCLUDED.collected_at, \
           youtube_source_id = COALESCE(EXCLUDED.youtube_source_id, \
                                        channel_videos.youtube_source_id)",
    )
    .bind(video.bvid)
    .bind(video.uid)
    .bind(video.title)
    .bind(video.description)
    .bind(video.duration_secs)
    .bind(video.views)
    .bind(video.likes)
    .bind(video.coins)
    .bind(video.favorites)
    .bind(video.shares)
    .bind(video.danmaku)
    .bind(video.comments)
    .bind(video.publish_time)
    .bind(video.collected_at)
    .bind(video.youtube_source_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Channel videos matching the filter, most viewed first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_channel_videos(
    pool: &PgPool,
    filter: &ChannelVideoFilter<'_>,
) -> Result<Vec<ChannelVideoRow>, DbError> {
    let mut sql = String::from(
        "SELECT bvid, uid, title, description, duration_secs, views, likes, coins, \
                favorites, shares, danmaku, comments, publish_time, collected_at, \
                youtube_source_id, label \
         FROM channel_videos WHERE 1=1",
    );

    if filter.uid.is_some() {
        sql.push_str(" AND uid = $1");
    }
    match filter.label {
        Some("unlabeled") => sql.push_str(" AND (label IS NULL OR label = '')"),
        Some(_) => {
            if filter.uid.is_some() {
                sql.push_str(" AND label = $2");
            } else {
                sql.push_str(" AND label = $1");
            }
        }
        None => {}
    }
    sql.push_str(" ORDER BY views DESC LIMIT ");
    sql.push_str(&filter.limit.max(1).to_string());

    let mut query = sqlx::query_as::<_, ChannelVideoRow>(&sql);
    if let Some(uid) = filter.uid {
        query = query.bind(uid);
    }
    if let Some(label) = filter.label {
        if label != "unlabeled" {
            query = query.bind(label);
        }
    }

    Ok(query.fetch_all(pool).await?)
}

/// Channel videos without a label yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unlabeled_channel_videos(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ChannelVideoRow>, DbError> {
    list_channel_videos(
        pool,
        &ChannelVideoFilter {
            uid: None,
            label: Some("unlabeled"),
            limit,
        },
    )
    .await
}

/// Set the label of a channel video. Returns `true` if a row changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_channel_video_label(
    pool: &PgPool,
    bvid: &str,
    label: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE channel_videos SET label = $1 WHERE bvid = $2")
        .bind(label)
        .bind(bvid)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Count of channel videos per label, with NULL/empty grouped as "unlabeled".
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_channel_video_labels(pool: &PgPool) -> Result<Vec<(String, i64)>, DbError> {
    Ok(sqlx::query_as::<_, (String, i64)>(
        "SELECT CASE WHEN label IS NULL OR label = '' THEN 'unlabeled' ELSE label END AS lbl, \
                COUNT(*) \
         FROM channel_videos \
         GROUP BY 1 ORDER BY 1",
    )
    .fetch_all(pool)
    .await?)
}
