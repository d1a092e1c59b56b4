//! Checkpoint tracking, channel monitoring, and outcome labeling.
//!
//! The [`Tracker`] drives per-upload checkpoint collection against a
//! [`MetricsStore`]; [`ChannelMonitor`] keeps the channel registry and its
//! recent videos fresh; [`VideoLabeler`] classifies channel videos in place.

mod labeler;
mod monitor;
mod store;
mod tracker;
mod youtube;

pub use labeler::{VideoLabelReport, VideoLabeler};
pub use monitor::{ChannelMonitor, ChannelScan};
pub use store::{ChannelStore, MetricsStore, PgChannelStore, PgMetricsStore};
pub use tracker::{CollectStatus, LabelReport, TrackReport, Tracker, TrackerError};
pub use youtube::extract_youtube_source_id;
