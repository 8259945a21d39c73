// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail transport that captures outgoing messages.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use envia_core::EnviaError;
use envia_email::{Mailer, MailerFactory, OutgoingEmail, SmtpSettings};

/// Captures every message passed to `send()`. Optionally fails every call
/// with a fixed transport error.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    failure: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every call fails with a non-retryable error.
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(message.to_string()),
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    fn check(&self) -> Result<(), EnviaError> {
        match &self.failure {
            Some(message) => Err(EnviaError::transport(message.clone(), Some(false))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EnviaError> {
        self.check()?;
        self.sent.lock().await.push(email.clone());
        Ok(())
    }

    async fn verify(&self) -> Result<(), EnviaError> {
        self.check()
    }
}

impl MailerFactory for RecordingMailer {
    fn connect(&self, _settings: &SmtpSettings) -> Result<Arc<dyn Mailer>, EnviaError> {
        Ok(Arc::new(self.clone()))
    }
}
