// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source of decrypted per-user service credentials.

use async_trait::async_trait;

use crate::error::EnviaError;
use crate::types::{EmailCredentials, ServiceType, WhatsAppCredentials};

/// Loads the active credential for a (user, service) pair.
///
/// `Ok(None)` means the user has no active credential for that service.
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    async fn whatsapp_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<WhatsAppCredentials>, EnviaError>;

    async fn email_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailCredentials>, EnviaError>;

    /// Record that the credential was just exercised by a configuration test.
    async fn mark_tested(&self, user_id: &str, service: ServiceType) -> Result<(), EnviaError>;
}
