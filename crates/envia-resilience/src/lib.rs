// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives wrapping every outbound delivery call.
//!
//! Every send composes the three pieces the same way:
//!
//! ```text
//! breaker.execute(|| retry_with_timeout(op, &retry, timeout, name))
//! ```

pub mod circuit_breaker;
pub mod classify;
pub mod registry;
pub mod retry;
pub mod timeout;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus};
pub use classify::{is_retryable, is_retryable_message};
pub use registry::CircuitBreakerRegistry;
pub use retry::{retry_with_backoff, retry_with_timeout, RetryConfig};
pub use timeout::with_timeout;

use std::future::Future;
use std::time::Duration;

use envia_config::RetryPolicyConfig;
use envia_core::EnviaError;

/// Full outbound policy: retry configuration plus per-attempt timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPolicy {
    pub retry: RetryConfig,
    pub timeout: Duration,
}

impl From<&RetryPolicyConfig> for CallPolicy {
    fn from(policy: &RetryPolicyConfig) -> Self {
        Self {
            retry: RetryConfig::from(policy),
            timeout: policy.timeout(),
        }
    }
}

/// Breaker around retry around timeout.
pub async fn guarded_call<T, F, Fut>(
    breaker: &CircuitBreaker,
    policy: &CallPolicy,
    operation: &str,
    op: F,
) -> Result<T, EnviaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EnviaError>>,
{
    breaker
        .execute(|| retry_with_timeout(op, &policy.retry, policy.timeout, operation))
        .await
}
