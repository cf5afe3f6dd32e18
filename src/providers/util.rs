use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Transport-level retry settings for HTTP lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_millis(300),
        }
    }
}

/// Sends a request, retrying connection failures, timeouts and 5xx responses.
///
/// Any other response, including 4xx, is handed back as-is so callers can
/// report it.
pub async fn with_retry<F, Fut>(mut send: F, policy: RetryPolicy) -> Result<reqwest::Response, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        let failure = match send().await {
            Ok(response) if !response.status().is_server_error() => return Ok(response),
            Ok(response) if attempt > policy.retries => return Ok(response),
            Ok(response) => format!("server responded {}", response.status()),
            Err(err) if attempt > policy.retries || !is_transient(&err) => {
                return Err(err.into());
            }
            Err(err) => err.to_string(),
        };

        debug!(
            "Attempt {}/{} failed: {}. Retrying...",
            attempt,
            policy.retries + 1,
            failure
        );
        attempt += 1;
        tokio::time::sleep(policy.delay).await;
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}
