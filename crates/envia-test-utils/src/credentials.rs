// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`CredentialProvider`] with plaintext credentials.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use envia_core::{
    CredentialProvider, EmailCredentials, EnviaError, ServiceType, WhatsAppCredentials,
};

/// Credentials keyed by user id, plus a log of `mark_tested` calls.
#[derive(Default)]
pub struct StaticCredentials {
    whatsapp: Mutex<HashMap<String, WhatsAppCredentials>>,
    email: Mutex<HashMap<String, EmailCredentials>>,
    tested: Mutex<Vec<(String, ServiceType)>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_whatsapp(self, user_id: &str, creds: WhatsAppCredentials) -> Self {
        self.whatsapp
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(user_id.to_string(), creds);
        self
    }

    pub fn with_email(self, user_id: &str, creds: EmailCredentials) -> Self {
        self.email
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(user_id.to_string(), creds);
        self
    }

    /// Every `mark_tested` call so far, in order.
    pub fn tested(&self) -> Vec<(String, ServiceType)> {
        self.tested.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

/// WhatsApp credentials with a token that passes the default prefix check.
pub fn sample_whatsapp() -> WhatsAppCredentials {
    WhatsAppCredentials {
        access_token: "EAAGtesttoken1234567890".to_string(),
        phone_number_id: "106540352242922".to_string(),
        webhook_url: None,
    }
}

pub fn sample_email() -> EmailCredentials {
    EmailCredentials {
        smtp_host: "smtp.example.org".to_string(),
        smtp_port: 587,
        smtp_user: "ops@example.org".to_string(),
        smtp_password: "app-password".to_string(),
        from_email: "ops@example.org".to_string(),
        from_name: Some("Ops".to_string()),
        use_ssl: None,
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn whatsapp_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<WhatsAppCredentials>, EnviaError> {
        Ok(self
            .whatsapp
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(user_id)
            .cloned())
    }

    async fn email_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailCredentials>, EnviaError> {
        Ok(self
            .email
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(user_id)
            .cloned())
    }

    async fn mark_tested(&self, user_id: &str, service: ServiceType) -> Result<(), EnviaError> {
        self.tested
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((user_id.to_string(), service));
        Ok(())
    }
}
