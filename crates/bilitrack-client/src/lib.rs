//! Rate-limited Bilibili web API client.
//!
//! Exposes [`BiliClient`] for fetching video metrics, channel profiles, and
//! recent-video listings, with a shared [`RateLimiter`] and bounded
//! exponential backoff via [`execute_with_retry`]. Content that has been
//! deleted or made private comes back as `Ok(None)` from every lookup.

mod client;
mod error;
mod rate_limit;
mod types;

pub use client::BiliClient;
pub use error::ClientError;
pub use rate_limit::{execute_with_retry, RateLimiter, RetryPolicy};
pub use types::{ChannelInfo, VideoStats, VideoSummary};
