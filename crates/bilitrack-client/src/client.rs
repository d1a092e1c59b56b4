//! HTTP client for the Bilibili web API.
//!
//! Wraps `reqwest` with envelope-aware error handling, a shared rate
//! limiter, and retry-with-backoff on every public method. Deleted or
//! private content surfaces as `Ok(None)` so callers can skip it without
//! special-casing error variants.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::ClientError;
use crate::rate_limit::{execute_with_retry, RateLimiter, RetryPolicy};
use crate::types::{
    AccountInfo, ApiResponse, ArcSearchData, ChannelInfo, RelationStat, VideoStats, VideoSummary,
    VideoView,
};

const DEFAULT_BASE_URL: &str = "https://api.bilibili.com/";

/// Page size for the channel video listing endpoint.
const VIDEO_PAGE_SIZE: u32 = 50;

/// What a gone-indicating envelope code refers to, which decides how the
/// code is interpreted: `62002` only means "gone" for videos, `-400` only
/// for accounts.
#[derive(Clone, Copy)]
enum Subject {
    Video,
    Account,
}

/// Client for the Bilibili web API.
///
/// Owns the HTTP client, the rate limiter, and the retry policy. Use
/// [`BiliClient::new`] for production or [`BiliClient::with_base_url`] to
/// point at a mock server in tests.
pub struct BiliClient {
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl BiliClient {
    /// Creates a new client pointed at the production Bilibili API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        min_interval: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ClientError> {
        Self::with_base_url(timeout_secs, user_agent, min_interval, retry, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        min_interval: Duration,
        retry: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join treats it as a directory rather than replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::new(min_interval),
            retry,
        })
    }

    /// Builds a client from the application config.
    ///
    /// # Errors
    ///
    /// Same as [`BiliClient::with_base_url`].
    pub fn from_app_config(config: &bilitrack_core::AppConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            config.api_timeout_secs,
            &config.api_user_agent,
            Duration::from_millis(config.api_min_interval_ms),
            RetryPolicy::from_app_config(config),
            &config.api_base_url,
        )
    }

    /// Fetches the current metric snapshot for one video.
    ///
    /// Returns `Ok(None)` when the video has been deleted or made private.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are exhausted.
    pub async fn get_video_stats(&self, bvid: &str) -> Result<Option<VideoStats>, ClientError> {
        let url = &self.build_url("x/web-interface/view", &[("bvid", bvid)]);
        let fetched = execute_with_retry(&self.limiter, self.retry, || async move {
            let view: VideoView = self.request(url, bvid, Subject::Video).await?;
            Ok(view)
        })
        .await?;
        Ok(fetched.map(VideoStats::from))
    }

    /// Fetches a channel's profile, merging in the follower count from the
    /// relation stat endpoint. A failure on the relation call is downgraded
    /// to a zero follower count rather than failing the whole lookup.
    ///
    /// Returns `Ok(None)` when the account no longer exists.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are exhausted on the
    /// profile call.
    pub async fn get_channel_info(&self, uid: &str) -> Result<Option<ChannelInfo>, ClientError> {
        let url = &self.build_url("x/space/acc/info", &[("mid", uid)]);
        let info = execute_with_retry(&self.limiter, self.retry, || async move {
            let info: AccountInfo = self.request(url, uid, Subject::Account).await?;
            Ok(info)
        })
        .await?;
        let Some(info) = info else {
            return Ok(None);
        };

        let stat_url = &self.build_url("x/relation/stat", &[("vmid", uid)]);
        let follower_count = match execute_with_retry(&self.limiter, self.retry, || async move {
            let stat: RelationStat = self.request(stat_url, uid, Subject::Account).await?;
            Ok(stat)
        })
        .await
        {
            Ok(stat) => stat.map_or(0, |s| s.follower),
            Err(err) => {
                tracing::warn!(uid, error = %err, "relation stat lookup failed, defaulting follower count to 0");
                0
            }
        };

        Ok(Some(ChannelInfo {
            uid: uid.to_owned(),
            name: info.name,
            description: info.sign,
            follower_count,
        }))
    }

    /// Fetches up to `count` most recently published videos for a channel,
    /// paging through the listing endpoint newest-first.
    ///
    /// Returns `Ok(None)` when the account no longer exists.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are exhausted on a page.
    pub async fn get_recent_videos(
        &self,
        uid: &str,
        count: usize,
    ) -> Result<Option<Vec<VideoSummary>>, ClientError> {
        let mut videos = Vec::with_capacity(count);
        let mut page = 1u32;

        while videos.len() < count {
            let pn = page.to_string();
            let ps = VIDEO_PAGE_SIZE.to_string();
            let url = &self.build_url(
                "x/space/arc/search",
                &[("mid", uid), ("pn", &pn), ("ps", &ps)],
            );
            let data = execute_with_retry(&self.limiter, self.retry, || async move {
                let data: ArcSearchData = self.request(url, uid, Subject::Account).await?;
                Ok(data)
            })
            .await?;
            let Some(data) = data else {
                return Ok(None);
            };

            if data.list.vlist.is_empty() {
                break;
            }
            let page_len = data.list.vlist.len();
            videos.extend(
                data.list
                    .vlist
                    .into_iter()
                    .take(count - videos.len())
                    .map(VideoSummary::from),
            );
            if page_len < VIDEO_PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }

        Ok(Some(videos))
    }

    /// Builds the full endpoint URL with query parameters, percent-encoded.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        // The base URL is guaranteed to end in a slash, so join cannot fail
        // on a relative path without a leading slash.
        let mut url = self
            .base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request, maps throttle/absence HTTP statuses, parses the
    /// JSON envelope, and unwraps its `data` payload.
    async fn request<T>(
        &self,
        url: &Url,
        id: &str,
        subject: Subject,
    ) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PRECONDITION_FAILED => {
                return Err(ClientError::Throttled {
                    endpoint: url.path().to_owned(),
                    code: i64::from(status.as_u16()),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(ClientError::Gone {
                    id: id.to_owned(),
                    code: i64::from(status.as_u16()),
                });
            }
            s if !s.is_success() => {
                return Err(ClientError::UnexpectedStatus {
                    status: s.as_u16(),
                    url: url.to_string(),
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        Self::check_envelope(&envelope, url, id, subject)?;
        envelope.data.ok_or_else(|| ClientError::Api {
            code: envelope.code,
            message: "missing data payload".to_owned(),
        })
    }

    /// Maps the envelope `code` field to the client error taxonomy.
    ///
    /// `-412` is the server-side throttle signal; `-404` means the subject is
    /// gone, as do `62002` (private video) and `-400` (malformed or deleted
    /// account id). Any other non-zero code is a plain API error.
    fn check_envelope<T>(
        envelope: &ApiResponse<T>,
        url: &Url,
        id: &str,
        subject: Subject,
    ) -> Result<(), ClientError> {
        let code = envelope.code;
        if code == 0 {
            return Ok(());
        }
        if code == -412 {
            return Err(ClientError::Throttled {
                endpoint: url.path().to_owned(),
                code,
            });
        }
        let gone = match subject {
            Subject::Video => code == -404 || code == 62002,
            Subject::Account => code == -404 || code == -400,
        };
        if gone {
            return Err(ClientError::Gone {
                id: id.to_owned(),
                code,
            });
        }
        Err(ClientError::Api {
            code,
            message: envelope.message.clone(),
        })
    }
}
