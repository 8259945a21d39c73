// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeout racing.

use std::future::Future;
use std::time::Duration;

use envia_core::EnviaError;

/// Race `future` against a timer.
///
/// When the timer wins the future is dropped, which cancels it at its next
/// await point.
pub async fn with_timeout<T, Fut>(
    future: Fut,
    duration: Duration,
    operation: &str,
) -> Result<T, EnviaError>
where
    Fut: Future<Output = Result<T, EnviaError>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = duration.as_millis() as u64, "timed out");
            Err(EnviaError::Timeout {
                operation: operation.to_string(),
                duration,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn timer_wins() {
        let err = with_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, EnviaError>(())
            },
            Duration::from_secs(15),
            "WhatsApp send",
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "WhatsApp send timed out after 15000ms");
    }

    #[tokio::test(start_paused = true)]
    async fn inner_error_passes_through() {
        let err = with_timeout(
            async { Err::<(), _>(EnviaError::Validation("bad phone".into())) },
            Duration::from_secs(1),
            "send",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EnviaError::Validation(_)));
    }
}
