//! Checkpoint collection and outcome labeling.
//!
//! [`Tracker`] walks the checkpoint schedule, fetches a metric snapshot for
//! each due upload, derives velocity and engagement, and persists the
//! result. Once an upload has matured past the labeling threshold its latest
//! snapshot is classified into an outcome tier.

use std::collections::BTreeMap;

use bilitrack_client::{BiliClient, ClientError};
use bilitrack_core::{engagement_rate, view_velocity, CheckpointSchedule, LabelThresholds};
use bilitrack_db::{DbError, NewOutcome, NewPerformance, UploadRow};
use chrono::Utc;
use serde::Serialize;

use crate::store::MetricsStore;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// What happened to one upload during a collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectStatus {
    /// A snapshot was recorded.
    Collected,
    /// The video is gone; nothing was written.
    Skipped,
}

/// Summary of one collection sweep across the schedule.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TrackReport {
    /// Snapshots recorded, keyed by checkpoint age in hours.
    pub by_checkpoint: BTreeMap<i32, u64>,
    /// Uploads whose video is gone.
    pub skipped: u64,
    /// Uploads that failed with a client error after retries.
    pub failed: u64,
}

impl TrackReport {
    #[must_use]
    pub fn collected(&self) -> u64 {
        self.by_checkpoint.values().sum()
    }
}

/// Summary of one labeling sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LabelReport {
    /// Outcomes written, keyed by tier name.
    pub by_label: BTreeMap<String, u64>,
    /// Eligible uploads without any performance snapshot to classify.
    pub skipped: u64,
}

impl LabelReport {
    #[must_use]
    pub fn labeled(&self) -> u64 {
        self.by_label.values().sum()
    }
}

/// Drives checkpoint collection and labeling against a [`MetricsStore`].
pub struct Tracker<S> {
    client: BiliClient,
    store: S,
    schedule: CheckpointSchedule,
    thresholds: LabelThresholds,
}

impl<S: MetricsStore> Tracker<S> {
    pub fn new(client: BiliClient, store: S) -> Self {
        Self {
            client,
            store,
            schedule: CheckpointSchedule::default(),
            thresholds: LabelThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_schedule(mut self, schedule: CheckpointSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: LabelThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Fetches and records one snapshot for `upload` at `checkpoint_hours`.
    ///
    /// A gone video records nothing and returns
    /// [`CollectStatus::Skipped`]; the upload stays in the due set but will
    /// keep skipping until the video reappears or ages out.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Client`] once retries are exhausted,
    /// [`TrackerError::Db`] if the write fails.
    pub async fn collect_one(
        &self,
        upload: &UploadRow,
        checkpoint_hours: i32,
    ) -> Result<CollectStatus, TrackerError> {
        let Some(stats) = self.client.get_video_stats(&upload.bvid).await? else {
            tracing::warn!(
                video_id = %upload.video_id,
                bvid = %upload.bvid,
                checkpoint_hours,
                "video gone, skipping snapshot"
            );
            return Ok(CollectStatus::Skipped);
        };

        let row = NewPerformance {
            upload_id: &upload.video_id,
            checkpoint_hours,
            recorded_at: Utc::now(),
            views: stats.views,
            likes: stats.likes,
            coins: stats.coins,
            favorites: stats.favorites,
            shares: stats.shares,
            danmaku: stats.danmaku,
            comments: stats.comments,
            view_velocity: view_velocity(stats.views, checkpoint_hours),
            engagement_rate: engagement_rate(
                stats.likes,
                stats.coins,
                stats.favorites,
                stats.views,
            ),
        };
        self.store.upsert_performance(&row).await?;

        tracing::info!(
            video_id = %upload.video_id,
            checkpoint_hours,
            views = stats.views,
            engagement_rate = row.engagement_rate,
            "snapshot recorded"
        );
        Ok(CollectStatus::Collected)
    }

    /// Runs one collection sweep: for every checkpoint age, every due upload
    /// gets a collection attempt.
    ///
    /// Client failures are isolated per upload (counted and logged, the
    /// sweep continues); a storage failure aborts the sweep.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Db`] if a query or write fails.
    pub async fn run_due_checkpoints(&self) -> Result<TrackReport, TrackerError> {
        let mut report = TrackReport::default();

        for &age in self.schedule.ages() {
            let due = self.store.due_for_checkpoint(age).await?;
            if due.is_empty() {
                continue;
            }
            tracing::info!(checkpoint_hours = age, due = due.len(), "collecting checkpoint");

            for upload in &due {
                match self.collect_one(upload, age).await {
                    Ok(CollectStatus::Collected) => {
                        *report.by_checkpoint.entry(age).or_insert(0) += 1;
                    }
                    Ok(CollectStatus::Skipped) => report.skipped += 1,
                    Err(TrackerError::Client(err)) => {
                        report.failed += 1;
                        tracing::error!(
                            video_id = %upload.video_id,
                            checkpoint_hours = age,
                            error = %err,
                            "collection failed"
                        );
                    }
                    Err(err @ TrackerError::Db(_)) => return Err(err),
                }
            }
        }

        Ok(report)
    }

    /// Labels every upload that has matured past `min_age_hours` and has no
    /// outcome yet.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Db`] if a query or write fails.
    pub async fn run_labeling(&self, min_age_hours: i32) -> Result<LabelReport, TrackerError> {
        let eligible = self.store.eligible_for_label(min_age_hours).await?;
        self.label_uploads(&eligible).await
    }

    /// Re-labels every matured upload with the current thresholds,
    /// overwriting existing outcomes.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Db`] if a query or write fails.
    pub async fn run_relabeling(&self, min_age_hours: i32) -> Result<LabelReport, TrackerError> {
        let eligible = self.store.eligible_for_relabel(min_age_hours).await?;
        self.label_uploads(&eligible).await
    }

    async fn label_uploads(&self, uploads: &[UploadRow]) -> Result<LabelReport, TrackerError> {
        let mut report = LabelReport::default();

        for upload in uploads {
            let Some(latest) = self.store.latest_performance(&upload.video_id).await? else {
                report.skipped += 1;
                continue;
            };

            let label =
                self.thresholds
                    .classify(latest.views, latest.engagement_rate, latest.coins);
            let outcome = NewOutcome {
                upload_id: &upload.video_id,
                label: label.as_str(),
                labeled_at: Utc::now(),
                final_views: latest.views,
                final_engagement_rate: latest.engagement_rate,
                final_coins: latest.coins,
            };
            self.store.upsert_outcome(&outcome).await?;

            tracing::info!(
                video_id = %upload.video_id,
                label = label.as_str(),
                final_views = latest.views,
                "outcome labeled"
            );
            *report.by_label.entry(label.as_str().to_owned()).or_insert(0) += 1;
        }

        Ok(report)
    }
}
