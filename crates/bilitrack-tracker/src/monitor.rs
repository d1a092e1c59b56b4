//! Channel monitoring: profile refresh plus recent-video collection.
//!
//! Each monitored channel gets its own [`BiliClient`] so per-channel rate
//! limiting holds even when several channels are scanned concurrently.

use bilitrack_core::AppConfig;
use bilitrack_db::{NewChannel, NewChannelVideo};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use bilitrack_client::BiliClient;

use crate::store::ChannelStore;
use crate::tracker::TrackerError;
use crate::youtube::extract_youtube_source_id;

/// Result of scanning one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelScan {
    pub uid: String,
    /// `false` when the account no longer exists; the channel is
    /// deactivated and nothing else is written.
    pub channel_found: bool,
    pub videos_recorded: u64,
    /// Videos whose title or description credits a YouTube source.
    pub with_source_id: u64,
    /// Videos whose detail fetch found them gone mid-scan.
    pub videos_gone: u64,
    /// Videos whose detail fetch failed after retries; the scan moves on
    /// to the rest of the listing.
    pub videos_failed: u64,
}

impl ChannelScan {
    fn missing(uid: &str) -> Self {
        Self {
            uid: uid.to_owned(),
            channel_found: false,
            videos_recorded: 0,
            with_source_id: 0,
            videos_gone: 0,
            videos_failed: 0,
        }
    }
}

/// Scans monitored channels: refreshes the profile row and upserts the most
/// recent videos with full counters.
pub struct ChannelMonitor<S> {
    store: S,
    config: AppConfig,
}

impl<S: ChannelStore> ChannelMonitor<S> {
    #[must_use]
    pub fn new(store: S, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Scans a single channel by uid.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Client`] once retries are exhausted on the profile or
    /// listing call, [`TrackerError::Db`] if a write fails. A failed detail
    /// fetch for an individual video is counted, not propagated.
    pub async fn collect_channel(
        &self,
        uid: &str,
        count: usize,
    ) -> Result<ChannelScan, TrackerError> {
        let client = BiliClient::from_app_config(&self.config)?;
        self.collect_with_client(&client, uid, count).await
    }

    /// Scans every active channel, at most `max_concurrent_channels` at a
    /// time, each with its own client.
    ///
    /// Per-channel failures are logged and reflected in the scan list; a
    /// channel registry read failure aborts the sweep.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Db`] if the channel registry cannot be read.
    pub async fn collect_all_active(
        &self,
        count: usize,
    ) -> Result<Vec<ChannelScan>, TrackerError> {
        let channels = self.store.list_channels(true).await?;
        tracing::info!(channels = channels.len(), "scanning active channels");

        let scans: Vec<ChannelScan> = stream::iter(channels)
            .map(|channel| async move {
                match self.collect_channel(&channel.uid, count).await {
                    Ok(scan) => Some(scan),
                    Err(err) => {
                        tracing::error!(uid = %channel.uid, error = %err, "channel scan failed");
                        None
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_channels.max(1))
            .filter_map(|scan| async move { scan })
            .collect()
            .await;

        Ok(scans)
    }

    async fn collect_with_client(
        &self,
        client: &BiliClient,
        uid: &str,
        count: usize,
    ) -> Result<ChannelScan, TrackerError> {
        let Some(info) = client.get_channel_info(uid).await? else {
            tracing::warn!(uid, "channel no longer exists, deactivating");
            self.store.deactivate_channel(uid).await?;
            return Ok(ChannelScan::missing(uid));
        };

        let Some(videos) = client.get_recent_videos(uid, count).await? else {
            // The account vanished between the two calls.
            tracing::warn!(uid, "channel disappeared mid-scan, deactivating");
            self.store.deactivate_channel(uid).await?;
            return Ok(ChannelScan::missing(uid));
        };

        let channel = NewChannel {
            uid,
            name: &info.name,
            description: &info.description,
            follower_count: info.follower_count,
            video_count: i64::try_from(videos.len()).unwrap_or(0),
        };
        self.store.upsert_channel(&channel).await?;

        let mut scan = ChannelScan {
            uid: uid.to_owned(),
            channel_found: true,
            videos_recorded: 0,
            with_source_id: 0,
            videos_gone: 0,
            videos_failed: 0,
        };

        for summary in videos {
            // The listing omits likes/coins/favorites, so each video gets a
            // full detail fetch before the upsert. A fetch failure is scoped
            // to that video; the rest of the listing still gets scanned.
            let stats = match client.get_video_stats(&summary.bvid).await {
                Ok(Some(stats)) => stats,
                Ok(None) => {
                    scan.videos_gone += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        uid,
                        bvid = %summary.bvid,
                        error = %err,
                        "video detail fetch failed, continuing scan"
                    );
                    scan.videos_failed += 1;
                    continue;
                }
            };

            let credit_text = format!("{} {}", stats.title, stats.description);
            let source_id = extract_youtube_source_id(&credit_text);
            if source_id.is_some() {
                scan.with_source_id += 1;
            }

            let video = NewChannelVideo {
                bvid: &stats.bvid,
                uid,
                title: &stats.title,
                description: &stats.description,
                duration_secs: stats.duration_secs,
                views: stats.views,
                likes: stats.likes,
                coins: stats.coins,
                favorites: stats.favorites,
                shares: stats.shares,
                danmaku: stats.danmaku,
                comments: stats.comments,
                publish_time: stats.publish_time.or(summary.publish_time),
                collected_at: Utc::now(),
                youtube_source_id: source_id.as_deref(),
            };
            self.store.upsert_channel_video(&video).await?;
            scan.videos_recorded += 1;
        }

        tracing::info!(
            uid,
            recorded = scan.videos_recorded,
            with_source = scan.with_source_id,
            failed = scan.videos_failed,
            "channel scan complete"
        );
        Ok(scan)
    }
}
