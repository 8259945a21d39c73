// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery adapter trait implemented by the WhatsApp and email adapters.

use async_trait::async_trait;

use crate::types::{Code, ConnectivityTestResult, DeliveryResult, SendOptions, ServiceType};

/// Sends a batch of codes through one external service.
///
/// Implementations catch every underlying failure and report it in the
/// returned value, so both methods are infallible from the caller's side.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync + 'static {
    /// The service this adapter talks to.
    fn service_type(&self) -> ServiceType;

    /// Deliver `codes` to `destination` as one atomic transport call.
    async fn send_codes(
        &self,
        user_id: &str,
        codes: &[Code],
        destination: &str,
        options: &SendOptions,
    ) -> DeliveryResult;

    /// Probe the user's stored configuration without sending a real payload.
    async fn test_configuration(&self, user_id: &str) -> ConnectivityTestResult;
}
