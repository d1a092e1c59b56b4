//! Storage seams for the checkpoint tracker and the channel scanner.
//!
//! [`MetricsStore`] is the narrow persistence surface the tracker needs:
//! which uploads are due, writing performance snapshots, reading the latest
//! one back, and writing outcomes. [`ChannelStore`] is the equivalent
//! surface for the channel monitor and video labeler. The production
//! implementations delegate to Postgres; tests substitute in-memory fakes.

use bilitrack_db::{
    ChannelRow, ChannelVideoFilter, ChannelVideoRow, DbError, NewChannel, NewChannelVideo,
    NewOutcome, NewPerformance, PerformanceRow, UploadRow,
};
use sqlx::PgPool;

/// Persistence operations the tracker depends on.
pub trait MetricsStore {
    /// Uploads old enough for a snapshot at `age_hours` that do not have one
    /// yet.
    fn due_for_checkpoint(
        &self,
        age_hours: i32,
    ) -> impl std::future::Future<Output = Result<Vec<UploadRow>, DbError>>;

    /// Writes a performance snapshot, overwriting any existing row for the
    /// same (upload, checkpoint age).
    fn upsert_performance(
        &self,
        row: &NewPerformance<'_>,
    ) -> impl std::future::Future<Output = Result<i64, DbError>>;

    /// The highest-age snapshot recorded for an upload, if any.
    fn latest_performance(
        &self,
        upload_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<PerformanceRow>, DbError>>;

    /// Uploads with a snapshot at age >= `min_age_hours` and no outcome yet.
    fn eligible_for_label(
        &self,
        min_age_hours: i32,
    ) -> impl std::future::Future<Output = Result<Vec<UploadRow>, DbError>>;

    /// Uploads with a snapshot at age >= `min_age_hours`, outcome or not.
    fn eligible_for_relabel(
        &self,
        min_age_hours: i32,
    ) -> impl std::future::Future<Output = Result<Vec<UploadRow>, DbError>>;

    /// Writes an outcome, overwriting any existing one for the upload.
    fn upsert_outcome(
        &self,
        outcome: &NewOutcome<'_>,
    ) -> impl std::future::Future<Output = Result<i64, DbError>>;
}

/// Persistence operations the channel monitor and video labeler depend on.
pub trait ChannelStore {
    /// Registered channels, optionally restricted to active ones.
    fn list_channels(
        &self,
        active_only: bool,
    ) -> impl std::future::Future<Output = Result<Vec<ChannelRow>, DbError>>;

    /// Marks a channel inactive. Returns `false` when the uid is unknown.
    fn deactivate_channel(
        &self,
        uid: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>>;

    /// Writes a channel profile, overwriting counters for an existing uid.
    fn upsert_channel(
        &self,
        channel: &NewChannel<'_>,
    ) -> impl std::future::Future<Output = Result<(), DbError>>;

    /// Writes a video snapshot keyed by bvid, overwriting counters.
    fn upsert_channel_video(
        &self,
        video: &NewChannelVideo<'_>,
    ) -> impl std::future::Future<Output = Result<(), DbError>>;

    /// Channel videos matching the filter, newest first.
    fn list_channel_videos(
        &self,
        filter: &ChannelVideoFilter<'_>,
    ) -> impl std::future::Future<Output = Result<Vec<ChannelVideoRow>, DbError>>;

    /// Channel videos that have no label yet.
    fn list_unlabeled_channel_videos(
        &self,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ChannelVideoRow>, DbError>>;

    /// Sets a video's label. Returns `false` when the bvid is unknown.
    fn update_channel_video_label(
        &self,
        bvid: &str,
        label: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>>;

    /// Per-label counts across all channel videos.
    fn count_channel_video_labels(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<(String, i64)>, DbError>>;
}

/// Postgres-backed [`MetricsStore`].
#[derive(Clone)]
pub struct PgMetricsStore {
    pool: PgPool,
}

impl PgMetricsStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MetricsStore for PgMetricsStore {
    async fn due_for_checkpoint(&self, age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        bilitrack_db::due_for_checkpoint(&self.pool, age_hours).await
    }

    async fn upsert_performance(&self, row: &NewPerformance<'_>) -> Result<i64, DbError> {
        bilitrack_db::upsert_performance(&self.pool, row).await
    }

    async fn latest_performance(
        &self,
        upload_id: &str,
    ) -> Result<Option<PerformanceRow>, DbError> {
        bilitrack_db::latest_performance(&self.pool, upload_id).await
    }

    async fn eligible_for_label(&self, min_age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        bilitrack_db::eligible_for_label(&self.pool, min_age_hours).await
    }

    async fn eligible_for_relabel(&self, min_age_hours: i32) -> Result<Vec<UploadRow>, DbError> {
        bilitrack_db::eligible_for_relabel(&self.pool, min_age_hours).await
    }

    async fn upsert_outcome(&self, outcome: &NewOutcome<'_>) -> Result<i64, DbError> {
        bilitrack_db::upsert_outcome(&self.pool, outcome).await
    }
}

/// Postgres-backed [`ChannelStore`].
#[derive(Clone)]
pub struct PgChannelStore {
    pool: PgPool,
}

impl PgChannelStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ChannelStore for PgChannelStore {
    async fn list_channels(&self, active_only: bool) -> Result<Vec<ChannelRow>, DbError> {
        bilitrack_db::list_channels(&self.pool, active_only).await
    }

    async fn deactivate_channel(&self, uid: &str) -> Result<bool, DbError> {
        bilitrack_db::deactivate_channel(&self.pool, uid).await
    }

    async fn upsert_channel(&self, channel: &NewChannel<'_>) -> Result<(), DbError> {
        bilitrack_db::upsert_channel(&self.pool, channel).await
    }

    async fn upsert_channel_video(&self, video: &NewChannelVideo<'_>) -> Result<(), DbError> {
        bilitrack_db::upsert_channel_video(&self.pool, video).await
    }

    async fn list_channel_videos(
        &self,
        filter: &ChannelVideoFilter<'_>,
    ) -> Result<Vec<ChannelVideoRow>, DbError> {
        bilitrack_db::list_channel_videos(&self.pool, filter).await
    }

    async fn list_unlabeled_channel_videos(
        &self,
        limit: i64,
    ) -> Result<Vec<ChannelVideoRow>, DbError> {
        bilitrack_db::list_unlabeled_channel_videos(&self.pool, limit).await
    }

    async fn update_channel_video_label(&self, bvid: &str, label: &str) -> Result<bool, DbError> {
        bilitrack_db::update_channel_video_label(&self.pool, bvid, label).await
    }

    async fn count_channel_video_labels(&self) -> Result<Vec<(String, i64)>, DbError> {
        bilitrack_db::count_channel_video_labels(&self.pool).await
    }
}
