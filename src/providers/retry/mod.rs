use anyhow::Result;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(60);
/// Longer base delay for 429 responses.
const RATE_LIMIT_BASE: Duration = Duration::from_secs(5);
/// `Retry-After` hints beyond this are ignored in favor of backoff.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// HTTP status codes that warrant a retry.
pub(crate) fn retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Exponential backoff delay for the given attempt (0-based).
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_DELAY)
}

/// Parse the `Retry-After` header: integer seconds first, then HTTP-date.
/// Returns `None` when absent or unparseable.
fn retry_after_delay(resp: &Response) -> Option<Duration> {
    let val = resp.headers().get("retry-after")?.to_str().ok()?;
    if let Ok(secs) = val.trim().parse::<u64>() {
        if secs > 0 {
            return Some(Duration::from_secs(secs));
        }
        return None;
    }
    let when = chrono::DateTime::parse_from_rfc2822(val.trim()).ok()?;
    let delay = when.with_timezone(&chrono::Utc) - chrono::Utc::now();
    delay.to_std().ok().filter(|d| !d.is_zero())
}

/// Send an HTTP request with retries for transient failures.
///
/// Network errors and status codes 429/500/502/503/504 are retried up to
/// three times with exponential backoff (1 s base, 60 s cap). For 429 the
/// base is 5 s and a `Retry-After` hint of at most 60 s takes precedence.
/// The builder closure produces a fresh request per attempt; the previous
/// response is dropped (closing its connection) before sleeping.
pub async fn send_with_retry<F>(build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_err: Option<reqwest::Error> = None;
    // (status, retry-after) of the previous retryable response
    let mut last_status: Option<(StatusCode, Option<Duration>)> = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = match last_status {
                Some((StatusCode::TOO_MANY_REQUESTS, retry_after)) => retry_after
                    .filter(|d| *d <= MAX_RETRY_AFTER)
                    .unwrap_or_else(|| backoff_delay(RATE_LIMIT_BASE, attempt - 1)),
                _ => backoff_delay(BASE_DELAY, attempt - 1),
            }
            .min(MAX_DELAY);
            warn!(
                "provider: retrying request (attempt {}/{}, waiting {:?})",
                attempt, MAX_RETRIES, delay
            );
            tokio::time::sleep(delay).await;
        }

        match build().send().await {
            Ok(resp) => {
                if !retryable_status(resp.status()) {
                    return Ok(resp);
                }
                let status = resp.status();
                let retry_after = retry_after_delay(&resp);
                debug!("provider: transient status {} on attempt {}", status, attempt);
                if attempt == MAX_RETRIES {
                    // Out of retries: hand the response back so the caller
                    // can report the API error body.
                    return Ok(resp);
                }
                last_status = Some((status, retry_after));
                last_err = None;
                // resp dropped here, closing the body before the retry sleep
            }
            Err(e) => {
                debug!("provider: network error on attempt {}: {}", attempt, e);
                last_status = None;
                last_err = Some(e);
            }
        }
    }

    Err(last_err.map_or_else(
        || anyhow::anyhow!("all retry attempts failed"),
        |e| anyhow::anyhow!("request failed after {} retries: {}", MAX_RETRIES, e),
    ))
}
