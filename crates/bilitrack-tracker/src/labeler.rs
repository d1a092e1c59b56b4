//! Outcome labeling for channel-scanned videos.
//!
//! Channel videos carry their counters inline, so classification works off
//! the stored row directly rather than a checkpoint snapshot.

use std::collections::BTreeMap;

use bilitrack_core::{engagement_rate, LabelThresholds};
use bilitrack_db::{ChannelVideoRow, DbError};
use serde::Serialize;

use crate::store::ChannelStore;

/// Summary of a channel-video labeling pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct VideoLabelReport {
    pub by_label: BTreeMap<String, u64>,
    /// Relabel only: videos whose label came out the same as before.
    pub unchanged: u64,
}

impl VideoLabelReport {
    #[must_use]
    pub fn labeled(&self) -> u64 {
        self.by_label.values().sum()
    }
}

/// Classifies channel videos with [`LabelThresholds`].
pub struct VideoLabeler<S> {
    store: S,
    thresholds: LabelThresholds,
}

impl<S: ChannelStore> VideoLabeler<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            thresholds: LabelThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: LabelThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    fn classify(&self, video: &ChannelVideoRow) -> &'static str {
        let rate = engagement_rate(video.likes, video.coins, video.favorites, video.views);
        self.thresholds
            .classify(video.views, rate, video.coins)
            .as_str()
    }

    /// Labels up to `limit` videos that have no label yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if a query or update fails.
    pub async fn label_unlabeled(&self, limit: i64) -> Result<VideoLabelReport, DbError> {
        let videos = self.store.list_unlabeled_channel_videos(limit).await?;
        let mut report = VideoLabelReport::default();

        for video in &videos {
            let label = self.classify(video);
            self.store
                .update_channel_video_label(&video.bvid, label)
                .await?;
            *report.by_label.entry(label.to_owned()).or_insert(0) += 1;
        }

        tracing::info!(labeled = report.labeled(), "channel videos labeled");
        Ok(report)
    }

    /// Re-labels up to `limit` videos (labeled or not) with the current
    /// thresholds, counting how many kept their previous label. Unchanged
    /// rows are not rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if a query or update fails.
    pub async fn relabel_all(&self, limit: i64) -> Result<VideoLabelReport, DbError> {
        let filter = bilitrack_db::ChannelVideoFilter {
            uid: None,
            label: None,
            limit,
        };
        let videos = self.store.list_channel_videos(&filter).await?;
        let mut report = VideoLabelReport::default();

        for video in &videos {
            let label = self.classify(video);
            if video.label.as_deref() == Some(label) {
                report.unchanged += 1;
                continue;
            }
            self.store
                .update_channel_video_label(&video.bvid, label)
                .await?;
            *report.by_label.entry(label.to_owned()).or_insert(0) += 1;
        }

        tracing::info!(
            labeled = report.labeled(),
            unchanged = report.unchanged,
            "channel videos relabeled"
        );
        Ok(report)
    }

    /// Label distribution across all channel videos.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn distribution(&self) -> Result<Vec<(String, i64)>, DbError> {
        self.store.count_channel_video_labels().await
    }
}
