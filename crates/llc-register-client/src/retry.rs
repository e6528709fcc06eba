//! Retry with exponential backoff for idempotent register reads.
//!
//! Only transport failures (connection refused, timeouts) are retried. Any
//! HTTP response, whatever its status, is returned to the caller as-is.

use std::time::Duration;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Ceiling on a single backoff delay.
const MAX_DELAY_MS: u64 = 10_000;

/// Delay before retry number `attempt + 1`, capped at [`MAX_DELAY_MS`].
fn backoff(attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt)
        .and_then(|factor| factor.checked_mul(BASE_DELAY_MS))
        .map_or(MAX_DELAY_MS, |ms| ms.min(MAX_DELAY_MS));
    Duration::from_millis(ms)
}

/// Send a request, retrying transport failures up to `max_retries` times.
///
/// The closure `f` is called at most `max_retries + 1` times.
pub(crate) async fn retry_send<F, Fut>(
    max_retries: u32,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                let delay = backoff(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    "register store request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}
