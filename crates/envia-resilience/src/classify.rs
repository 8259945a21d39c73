// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry classification of delivery errors.

use envia_core::EnviaError;

/// Substrings that mark an error as permanent. Checked before
/// [`RETRYABLE_PATTERNS`].
pub const NON_RETRYABLE_PATTERNS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "invalid token",
    "authentication",
    "permission denied",
    "access denied",
    "bad request",
];

/// Substrings that mark an error as transient.
pub const RETRYABLE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "connection",
    "network",
    "reset",
    "refused",
    "socket hang up",
    "5xx",
    "rate limit",
    "throttled",
    "unavailable",
    "gateway",
];

/// Whether a failed attempt should be retried.
///
/// Typed variants decide first. Everything else falls back to matching the
/// lower-cased message; unknown errors are retried.
pub fn is_retryable(err: &EnviaError) -> bool {
    match err {
        EnviaError::Authorization { .. }
        | EnviaError::Validation(_)
        | EnviaError::Config(_)
        | EnviaError::CircuitOpen { .. }
        | EnviaError::Decryption
        | EnviaError::NotFound { .. }
        | EnviaError::AccessDenied { .. }
        | EnviaError::InvalidTransition { .. } => false,
        EnviaError::Timeout { .. } => true,
        EnviaError::Transport {
            retryable: Some(verdict),
            ..
        } => *verdict,
        EnviaError::RetryExhausted { last_error, .. } => is_retryable(last_error),
        other => is_retryable_message(&other.to_string()),
    }
}

/// Message-only classification for errors without a typed verdict.
pub fn is_retryable_message(message: &str) -> bool {
    let message = message.to_lowercase();
    if NON_RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        return false;
    }
    if RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        return true;
    }
    true
}
