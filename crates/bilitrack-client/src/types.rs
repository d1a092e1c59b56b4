//! Wire types for the Bilibili web API.
//!
//! Every endpoint wraps its payload in the same `{code, message, data}`
//! envelope; a zero code means success and `data` carries the payload.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Common response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// `/x/web-interface/view` payload.
#[derive(Debug, Deserialize)]
pub struct VideoView {
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: i64,
    /// Publish time as a unix timestamp.
    #[serde(default)]
    pub pubdate: i64,
    pub stat: VideoStat,
}

/// Engagement counters nested under `stat` in view and search payloads.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct VideoStat {
    #[serde(default)]
    pub view: i64,
    #[serde(default)]
    pub like: i64,
    #[serde(default)]
    pub coin: i64,
    #[serde(default)]
    pub favorite: i64,
    #[serde(default)]
    pub share: i64,
    #[serde(default)]
    pub danmaku: i64,
    #[serde(default)]
    pub reply: i64,
}

/// Flattened snapshot of one video's metrics, as returned by the client.
#[derive(Debug, Clone)]
pub struct VideoStats {
    pub bvid: String,
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
}

impl From<VideoView> for VideoStats {
    fn from(view: VideoView) -> Self {
        Self {
            bvid: view.bvid,
            title: view.title,
            description: view.desc,
            duration_secs: view.duration,
            views: view.stat.view,
            likes: view.stat.like,
            coins: view.stat.coin,
            favorites: view.stat.favorite,
            shares: view.stat.share,
            danmaku: view.stat.danmaku,
            comments: view.stat.reply,
            publish_time: timestamp_to_utc(view.pubdate),
        }
    }
}

/// `/x/space/acc/info` payload.
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sign: String,
}

/// `/x/relation/stat` payload.
#[derive(Debug, Default, Deserialize)]
pub struct RelationStat {
    #[serde(default)]
    pub follower: i64,
}

/// Channel profile as returned by the client, with the follower count
/// merged in from the relation stat endpoint when available.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub uid: String,
    pub name: String,
    pub description: String,
    pub follower_count: i64,
}

/// `/x/space/arc/search` payload: `data.list.vlist`.
#[derive(Debug, Deserialize)]
pub struct ArcSearchData {
    pub list: ArcSearchList,
}

#[derive(Debug, Deserialize)]
pub struct ArcSearchList {
    #[serde(default)]
    pub vlist: Vec<ArcSearchVideo>,
}

#[derive(Debug, Deserialize)]
pub struct ArcSearchVideo {
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Duration as a clock string, `"MM:SS"` or `"HH:MM:SS"`.
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub play: i64,
    #[serde(default)]
    pub comment: i64,
    #[serde(default)]
    pub created: i64,
}

/// Summary of a recently published video from the channel listing.
///
/// The listing carries fewer counters than the view endpoint; likes, coins
/// and the rest come from a follow-up per-video fetch when needed.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub bvid: String,
    pub title: String,
    pub description: String,
    pub duration_secs: i64,
    pub views: i64,
    pub comments: i64,
    pub publish_time: Option<DateTime<Utc>>,
}

impl From<ArcSearchVideo> for VideoSummary {
    fn from(video: ArcSearchVideo) -> Self {
        let duration_secs = parse_duration(&video.length).unwrap_or(0);
        Self {
            bvid: video.bvid,
            title: video.title,
            description: video.description,
            duration_secs,
            views: video.play,
            comments: video.comment,
            publish_time: timestamp_to_utc(video.created),
        }
    }
}

fn timestamp_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

/// Parses a `"MM:SS"` or `"HH:MM:SS"` clock string into seconds.
pub(crate) fn parse_duration(raw: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    for part in &parts {
        let value: i64 = part.trim().parse().ok()?;
        total = total * 60 + value;
    }
    Some(total)
}
