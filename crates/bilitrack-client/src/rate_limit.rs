//! Rate limiting and retry for the Bilibili API client.
//!
//! [`RateLimiter`] enforces a minimum wall-clock spacing between outbound
//! calls; [`execute_with_retry`] layers bounded exponential backoff on top,
//! treating "content gone" as an expected absent result rather than an error.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ClientError;

/// Serialises outbound calls so that at least `min_interval` elapses between
/// them. Concurrent callers sharing one limiter queue through the internal
/// mutex; the last-call instant is stamped on every invocation, including
/// retries.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until `min_interval` has elapsed since the previous call, then
    /// records the current instant as the new last call.
    pub async fn wait(&self) {
        // The lock is held across the sleep so a second caller cannot slip
        // through the gate mid-wait.
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Retry policy: attempt cap plus the two backoff curves.
///
/// Throttled errors sleep `throttle_backoff_base_secs * 2^attempt` before the
/// next try; all other retriable errors sleep
/// `error_backoff_base_secs * 2^attempt`. Both curves are injectable so tests
/// can zero them out.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub throttle_backoff_base_secs: u64,
    pub error_backoff_base_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            throttle_backoff_base_secs: 2,
            error_backoff_base_secs: 1,
        }
    }
}

impl RetryPolicy {
    /// Policy derived from the application config.
    #[must_use]
    pub fn from_app_config(config: &bilitrack_core::AppConfig) -> Self {
        Self {
            max_retries: config.api_max_retries,
            throttle_backoff_base_secs: config.api_throttle_backoff_base_secs,
            error_backoff_base_secs: config.api_error_backoff_base_secs,
        }
    }

    fn backoff_delay(&self, err: &ClientError, attempt: u32) -> Duration {
        let base = if matches!(err, ClientError::Throttled { .. }) {
            self.throttle_backoff_base_secs
        } else {
            self.error_backoff_base_secs
        };
        // Cap the shift to prevent overflow on extreme configs.
        Duration::from_secs(base.saturating_mul(1u64 << attempt.min(62)))
    }
}

/// Returns `true` if `err` is worth retrying after a backoff delay.
///
/// Everything transient is retried: throttling, network failures, malformed
/// responses, unexpected API codes. Only permanent absence
/// ([`ClientError::Gone`]) and construction-time errors are excluded —
/// [`execute_with_retry`] short-circuits `Gone` before this is consulted.
fn is_retriable(err: &ClientError) -> bool {
    !matches!(
        err,
        ClientError::Gone { .. } | ClientError::InvalidBaseUrl { .. }
    )
}

/// Executes `operation` through the rate-limit gate with bounded exponential
/// backoff retries.
///
/// Every attempt, including retries, first passes through
/// [`RateLimiter::wait`] so the spacing invariant holds across the whole
/// retry loop.
///
/// A [`ClientError::Gone`] result returns `Ok(None)` immediately: deleted or
/// private content is an expected terminal outcome, not an error, and does
/// not consume a retry. Retriable errors sleep per [`RetryPolicy`] and try
/// again up to `max_retries` additional attempts; exhausting the cap
/// surfaces the last error.
///
/// # Errors
///
/// Returns the final [`ClientError`] once retries are exhausted.
pub async fn execute_with_retry<T, F, Fut>(
    limiter: &RateLimiter,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<Option<T>, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0u32;

    loop {
        limiter.wait().await;

        match operation().await {
            Ok(value) => return Ok(Some(value)),
            Err(ClientError::Gone { id, code }) => {
                tracing::warn!(%id, code, "content gone — skipping");
                return Ok(None);
            }
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                let delay = policy.backoff_delay(&err, attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "transient API error — retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
