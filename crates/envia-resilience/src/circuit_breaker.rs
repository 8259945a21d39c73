// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-service circuit breaker.
//!
//! Closed: calls pass through; a failure increments the counter and a
//! success resets it. Once the counter reaches the threshold the breaker
//! opens and rejects calls without running them. The first call made more
//! than `recovery_time` after the last failure closes the breaker again
//! (counter back to zero) and runs normally. There is no half-open probe
//! limit: concurrent callers arriving together after recovery all run.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use envia_config::ResilienceConfig;
use envia_core::EnviaError;
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_time: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_time: Duration::from_secs(30),
        }
    }
}

impl From<&ResilienceConfig> for CircuitBreakerConfig {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            recovery_time: config.recovery_time(),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
    is_open: bool,
}

/// Point-in-time copy of a breaker's state.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerStatus {
    pub name: String,
    pub failure_count: u32,
    pub is_open: bool,
    /// Time since the last recorded failure, if any.
    pub since_last_failure: Option<Duration>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        // State stays consistent even if a holder panicked; no await happens under the lock.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `op` through the breaker.
    ///
    /// The failure timestamp is the moment the call was admitted, not the
    /// moment it failed, so a long retry sequence counts from its start.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, EnviaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, EnviaError>>,
    {
        let started = Instant::now();
        self.admit(started)?;

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure(started);
                Err(err)
            }
        }
    }

    fn admit(&self, now: Instant) -> Result<(), EnviaError> {
        let mut state = self.lock();
        if !state.is_open {
            return Ok(());
        }
        let recovered = state
            .last_failure
            .is_some_and(|last| now.saturating_duration_since(last) > self.config.recovery_time);
        if recovered {
            state.is_open = false;
            state.failure_count = 0;
            info!(breaker = %self.name, "circuit breaker reset");
            Ok(())
        } else {
            warn!(breaker = %self.name, "circuit breaker open, rejecting call");
            Err(EnviaError::CircuitOpen {
                service: self.name.clone(),
            })
        }
    }

    fn record_success(&self) {
        let mut state = self.lock();
        if state.failure_count > 0 {
            info!(breaker = %self.name, previous_failures = state.failure_count, "success after failures");
            state.failure_count = 0;
        }
    }

    fn record_failure(&self, started: Instant) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure = Some(started);
        warn!(
            breaker = %self.name,
            failures = state.failure_count,
            threshold = self.config.failure_threshold,
            "call failed"
        );
        if state.failure_count >= self.config.failure_threshold && !state.is_open {
            state.is_open = true;
            error!(breaker = %self.name, "circuit breaker opened");
        }
    }

    pub fn status(&self) -> CircuitBreakerStatus {
        let state = self.lock();
        CircuitBreakerStatus {
            name: self.name.clone(),
            failure_count: state.failure_count,
            is_open: state.is_open,
            since_last_failure: state.last_failure.map(|t| t.elapsed()),
        }
    }
}
