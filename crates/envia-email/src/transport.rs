// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP transport behind the [`Mailer`] seam.
//!
//! [`SmtpMailer`] wraps a lettre `AsyncSmtpTransport`. Tests substitute
//! their own [`MailerFactory`] so no socket is ever opened.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use envia_core::{EmailCredentials, EnviaError};

use crate::presets::ProviderPreset;

/// How TLS is negotiated for a given port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Implicit TLS from the first byte (SMTPS, port 465).
    Wrapper,
    /// STARTTLS is mandatory (submission, port 587).
    Required,
    /// STARTTLS when the server offers it.
    Opportunistic,
}

impl TlsMode {
    pub fn for_port(port: u16) -> Self {
        match port {
            465 => Self::Wrapper,
            587 => Self::Required,
            _ => Self::Opportunistic,
        }
    }
}

/// Connection parameters resolved from stored credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub preset: ProviderPreset,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("preset", &self.preset)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl SmtpSettings {
    /// Explicit host and port are used as given. A provider preset fills
    /// them in only when they are absent: a blank host takes the relay of
    /// the provider detected from the account address, and port `0` takes
    /// the preset's submission port.
    pub fn from_credentials(creds: &EmailCredentials, timeout: Duration) -> Result<Self, EnviaError> {
        let explicit_host = creds.smtp_host.trim();
        let (host, preset) = if explicit_host.is_empty() {
            let account = [&creds.smtp_user, &creds.from_email]
                .into_iter()
                .find(|a| !a.trim().is_empty())
                .map_or("", String::as_str);
            let preset = ProviderPreset::detect(account);
            let relay = preset.relay_host().ok_or_else(|| {
                EnviaError::Config("SMTP host is required for this provider".to_string())
            })?;
            (relay.to_string(), preset)
        } else {
            (explicit_host.to_string(), ProviderPreset::detect(explicit_host))
        };

        let port = match creds.smtp_port {
            0 => preset.default_port(),
            p => u16::try_from(p).ok(),
        }
        .ok_or_else(|| {
            EnviaError::Config(format!(
                "invalid SMTP port {} (must be between 1 and 65535)",
                creds.smtp_port
            ))
        })?;

        Ok(Self {
            host,
            port,
            tls: TlsMode::for_port(port),
            preset,
            username: creds.smtp_user.clone(),
            password: creds.smtp_password.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A fully rendered message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message. One attempt, no retry.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EnviaError>;

    /// Connect, negotiate TLS, authenticate, and disconnect.
    async fn verify(&self) -> Result<(), EnviaError>;
}

pub trait MailerFactory: Send + Sync {
    fn connect(&self, settings: &SmtpSettings) -> Result<Arc<dyn Mailer>, EnviaError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, EnviaError> {
        let params = TlsParameters::new(settings.host.clone()).map_err(|e| EnviaError::Transport {
            message: format!("tls setup failed for {}: {e}", settings.host),
            retryable: Some(false),
            source: Some(Box::new(e)),
        })?;
        let tls = match settings.tls {
            TlsMode::Wrapper => Tls::Wrapper(params),
            TlsMode::Required => Tls::Required(params),
            TlsMode::Opportunistic => Tls::Opportunistic(params),
        };
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host.as_str())
            .port(settings.port)
            .tls(tls)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();
        debug!(endpoint = %settings.endpoint(), tls = ?settings.tls, preset = %settings.preset, "smtp transport built");
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EnviaError> {
        let message = build_message(email)?;
        self.transport.send(message).await.map_err(classify_smtp_error)?;
        Ok(())
    }

    async fn verify(&self) -> Result<(), EnviaError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EnviaError::transport(
                "connection to SMTP server could not be verified",
                Some(true),
            )),
            Err(e) => Err(classify_smtp_error(e)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailerFactory;

impl MailerFactory for SmtpMailerFactory {
    fn connect(&self, settings: &SmtpSettings) -> Result<Arc<dyn Mailer>, EnviaError> {
        Ok(Arc::new(SmtpMailer::new(settings)?))
    }
}

fn parse_mailbox(value: &str, role: &str) -> Result<Mailbox, EnviaError> {
    value
        .parse::<Mailbox>()
        .map_err(|e| EnviaError::Validation(format!("invalid {role} address {value:?}: {e}")))
}

fn build_message(email: &OutgoingEmail) -> Result<Message, EnviaError> {
    Message::builder()
        .from(parse_mailbox(&email.from, "sender")?)
        .to(parse_mailbox(&email.to, "recipient")?)
        .subject(email.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))
        .map_err(|e| EnviaError::Validation(format!("failed to build email: {e}")))
}

/// Map a lettre SMTP error onto the error taxonomy. Authentication
/// rejections (5.3.x / 535) are never retried; other permanent replies and
/// TLS failures are permanent transport errors; the rest is transient.
fn classify_smtp_error(e: lettre::transport::smtp::Error) -> EnviaError {
    let status = e.status().map(|code| code.to_string());
    let message = e.to_string();
    if e.is_permanent() {
        if status.as_deref().is_some_and(|s| s.starts_with("53")) {
            return EnviaError::Authorization {
                message: format!("authentication failed: {message}"),
                status: status.and_then(|s| s.parse().ok()),
            };
        }
        return EnviaError::Transport {
            message: format!("SMTP server rejected the message: {message}"),
            retryable: Some(false),
            source: Some(Box::new(e)),
        };
    }
    if e.is_tls() {
        return EnviaError::Transport {
            message: format!("tls error: {message}"),
            retryable: Some(false),
            source: Some(Box::new(e)),
        };
    }
    let retryable = if e.is_transient() || e.is_timeout() {
        Some(true)
    } else {
        None
    };
    EnviaError::Transport {
        message: format!("connection error: {message}"),
        retryable,
        source: Some(Box::new(e)),
    }
}
