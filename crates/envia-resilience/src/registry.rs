// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One circuit breaker per delivery service.

use std::sync::Arc;

use envia_config::ResilienceConfig;
use envia_core::ServiceType;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus};

/// Owns the breakers for every [`ServiceType`]. Built once at startup and
/// shared with the adapters; state lives as long as the registry.
#[derive(Debug, Clone)]
pub struct CircuitBreakerRegistry {
    whatsapp: Arc<CircuitBreaker>,
    email: Arc<CircuitBreaker>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            whatsapp: Arc::new(CircuitBreaker::new(
                ServiceType::Whatsapp.to_string(),
                config.clone(),
            )),
            email: Arc::new(CircuitBreaker::new(ServiceType::Email.to_string(), config)),
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(CircuitBreakerConfig::from(config))
    }

    pub fn get(&self, service: ServiceType) -> Arc<CircuitBreaker> {
        match service {
            ServiceType::Whatsapp => Arc::clone(&self.whatsapp),
            ServiceType::Email => Arc::clone(&self.email),
        }
    }

    pub fn statuses(&self) -> Vec<CircuitBreakerStatus> {
        vec![self.whatsapp.status(), self.email.status()]
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
