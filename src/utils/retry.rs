// Retry utilities: bounded attempts with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::logger::{LogLevel, LogSink};
use crate::config::RetryConfig;

/// How often and how patiently an operation is re-attempted
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            max_attempts,
            delay,
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_delay_ms),
            config.backoff,
        )
    }

    /// Attempts actually made; zero still means one try
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait that follows the `attempt`-th failure (1-based).
    ///
    /// Saturates at `Duration::MAX` on overflow; a NaN or negative product
    /// becomes zero.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = (self.delay.as_secs_f64() * self.backoff.powi(exponent)).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Run `operation` under `policy`, returning the last error unchanged once
/// every attempt has failed.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    logger: &dyn LogSink,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_notify(policy, logger, operation, |_, _| {}).await
}

/// Same as [`with_retry`], calling `notify(attempt, delay)` before each wait.
pub async fn with_retry_notify<F, Fut, T, E, N>(
    policy: &RetryPolicy,
    logger: &dyn LogSink,
    mut operation: F,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    N: FnMut(u32, Duration),
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                attempt += 1;
                if attempt >= max_attempts {
                    logger.log(
                        LogLevel::Error,
                        &format!("Operation failed after {} attempts: {}", attempt, error),
                    );
                    return Err(error);
                }

                let delay = policy.delay_after(attempt);
                logger.log(
                    LogLevel::Warning,
                    &format!(
                        "Attempt {} failed. Retrying in {:.1}s... ({})",
                        attempt,
                        delay.as_secs_f64(),
                        error
                    ),
                );
                notify(attempt, delay);
                sleep(delay).await;
            }
        }
    }
}
