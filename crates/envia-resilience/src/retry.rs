// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use envia_config::RetryPolicyConfig;
use envia_core::EnviaError;
use tracing::{debug, info, warn};

use crate::classify::is_retryable;
use crate::timeout::with_timeout;

/// Backoff parameters for one retried operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay slept after failed attempt `attempt` (1-based):
    /// `min(initial * base^(attempt-1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.exponential_base.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

impl From<&RetryPolicyConfig> for RetryConfig {
    fn from(policy: &RetryPolicyConfig) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            initial_delay: policy.initial_delay(),
            max_delay: policy.max_delay(),
            exponential_base: policy.exponential_base,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// A non-retryable error is returned as-is. Running out of attempts yields
/// [`EnviaError::RetryExhausted`] wrapping the last error.
pub async fn retry_with_backoff<T, F, Fut>(
    mut op: F,
    config: &RetryConfig,
    operation: &str,
) -> Result<T, EnviaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EnviaError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!(operation, attempt, max_attempts, "attempting");
        let err = match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        warn!(operation, attempt, max_attempts, error = %err, "attempt failed");

        if !is_retryable(&err) {
            debug!(operation, "error is not retryable");
            return Err(err);
        }
        if attempt >= max_attempts {
            return Err(EnviaError::RetryExhausted {
                operation: operation.to_string(),
                attempts: attempt,
                last_error: Box::new(err),
            });
        }

        let delay = config.delay_for(attempt);
        debug!(operation, delay_ms = delay.as_millis() as u64, "backing off");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// [`retry_with_backoff`] where every attempt is raced against `timeout`.
pub async fn retry_with_timeout<T, F, Fut>(
    mut op: F,
    config: &RetryConfig,
    timeout: Duration,
    operation: &str,
) -> Result<T, EnviaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EnviaError>>,
{
    retry_with_backoff(|| with_timeout(op(), timeout, operation), config, operation).await
}
