//! Bounded retries with exponential backoff
//!
//! Used where the API server is briefly behind the installer, such as
//! discovery of a group whose CRD was created a moment ago.

use std::time::Duration;

use tracing::warn;

/// Backoff settings for a bounded retry
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            backoff_multiplier: 2.0,
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `retryable`
/// rejects, or the attempts are used up
///
/// Returns the last error once attempts run out.
pub async fn retry_while<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !retryable(&e) || attempt >= config.max_attempts.max(1) => return Err(e),
            Err(e) => {
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(delay).await;

                let next = delay.as_secs_f64() * config.backoff_multiplier.max(1.0);
                delay = Duration::from_secs_f64(next.min(config.max_delay.as_secs_f64()));
            }
        }
    }
}
