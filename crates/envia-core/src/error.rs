// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Envia delivery core.

use std::time::Duration;

use thiserror::Error;

use crate::types::CodeStatus;

/// The primary error type used across the delivery core.
///
/// Resilience primitives and storage operations return this error. Delivery
/// adapters never surface it directly; they convert it into a structured
/// [`DeliveryResult`](crate::types::DeliveryResult) or
/// [`ConnectivityTestResult`](crate::types::ConnectivityTestResult).
#[derive(Debug, Error)]
pub enum EnviaError {
    /// Missing or invalid credentials / configuration. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed caller input such as a destination address. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network, 5xx, or rate-limit failures talking to an external service.
    ///
    /// `retryable` carries the adapter's verdict (e.g. from the HTTP status).
    /// `None` leaves the decision to message classification.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        retryable: Option<bool>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider rejected our credentials (HTTP 401/403, SMTP 535). Never retried.
    #[error("authorization error: {message}")]
    Authorization { message: String, status: Option<u16> },

    /// The per-service circuit breaker is open; the operation was not attempted.
    #[error("circuit breaker is open for {service}, try again later")]
    CircuitOpen { service: String },

    /// An operation lost the race against its timer.
    #[error("{operation} timed out after {}ms", duration.as_millis())]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Every retry attempt failed with a retryable error.
    #[error("{operation} failed after {attempts} attempts. Last error: {last_error}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last_error: Box<EnviaError>,
    },

    /// Sealed credential data could not be opened (tampered, wrong key, malformed).
    #[error("decryption failed")]
    Decryption,

    /// Vault setup or sealing errors.
    #[error("vault error: {0}")]
    Vault(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The entity exists but is not owned by the calling user.
    #[error("access denied to {entity} {id}")]
    AccessDenied { entity: &'static str, id: String },

    /// A code status change that the lifecycle does not allow, or whose
    /// precondition status did not match the stored one.
    #[error("code {code_id} cannot move from {from} to {to}")]
    InvalidTransition {
        code_id: String,
        from: CodeStatus,
        to: CodeStatus,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EnviaError {
    /// Shorthand for a transport error with an explicit retry verdict.
    pub fn transport(message: impl Into<String>, retryable: Option<bool>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
            source: None,
        }
    }

    /// Stable machine-readable code for user-facing payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::CircuitOpen { .. } => "CIRCUIT_OPEN",
            Self::Timeout { .. } => "TIMEOUT",
            Self::RetryExhausted { .. } => "RETRY_EXHAUSTED",
            Self::Decryption => "DECRYPTION_ERROR",
            Self::Vault(_) => "VAULT_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The innermost error, looking through retry aggregation.
    pub fn root(&self) -> &EnviaError {
        match self {
            Self::RetryExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }
}
