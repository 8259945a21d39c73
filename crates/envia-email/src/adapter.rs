// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP implementation of [`DeliveryAdapter`].

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tokio::time::Instant;
use tracing::{info, warn};

use envia_config::EmailConfig;
use envia_core::{
    Code, CodeStatus, ConnectivityDetails, ConnectivityTestResult, CredentialProvider,
    DeliveryAdapter, DeliveryResult, EmailCredentials, EnviaError, SendOptions, ServiceType,
};
use envia_resilience::{guarded_call, retry_with_timeout, CallPolicy, CircuitBreaker};

use crate::content::{default_footer, default_subject, render};
use crate::diagnostics;
use crate::transport::{MailerFactory, OutgoingEmail, SmtpSettings};

static EMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub fn is_valid_email(address: &str) -> bool {
    EMAIL_ADDRESS.is_match(address)
}

pub struct EmailAdapter {
    credentials: Arc<dyn CredentialProvider>,
    breaker: Arc<CircuitBreaker>,
    mailers: Arc<dyn MailerFactory>,
    service_name: String,
    footer: String,
    connection_timeout: Duration,
    send_policy: CallPolicy,
    test_policy: CallPolicy,
}

impl std::fmt::Debug for EmailAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailAdapter")
            .field("breaker", &self.breaker.name())
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

impl EmailAdapter {
    pub fn new(
        config: &EmailConfig,
        service_name: &str,
        credentials: Arc<dyn CredentialProvider>,
        breaker: Arc<CircuitBreaker>,
        mailers: Arc<dyn MailerFactory>,
    ) -> Self {
        Self {
            credentials,
            breaker,
            mailers,
            service_name: service_name.to_string(),
            footer: config
                .message_footer
                .clone()
                .unwrap_or_else(|| default_footer(service_name)),
            connection_timeout: config.connection_timeout(),
            send_policy: CallPolicy::from(&config.send),
            test_policy: CallPolicy::from(&config.test),
        }
    }

    fn sender(&self, creds: &EmailCredentials) -> String {
        let address = if creds.from_email.trim().is_empty() {
            creds.smtp_user.trim()
        } else {
            creds.from_email.trim()
        };
        let name = creds
            .from_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.service_name);
        format!("{name} <{address}>")
    }

    async fn deliver(
        &self,
        user_id: &str,
        codes: &[Code],
        to: &str,
        options: &SendOptions,
    ) -> Result<(), EnviaError> {
        if codes.is_empty() {
            return Err(EnviaError::Validation("no codes to send".to_string()));
        }
        let creds = self.credentials.email_credentials(user_id).await?.ok_or_else(|| {
            EnviaError::Config("email settings not found, configure them in settings first".to_string())
        })?;
        let to = to.trim();
        if !is_valid_email(to) {
            return Err(EnviaError::Validation(format!("invalid email address: {to}")));
        }

        let settings = SmtpSettings::from_credentials(&creds, self.connection_timeout)?;
        let mailer = self.mailers.connect(&settings)?;
        let now = Utc::now();
        let body = render(codes, options.custom_message.as_deref(), &self.footer, now);
        let email = OutgoingEmail {
            from: self.sender(&creds),
            to: to.to_string(),
            subject: options.subject.clone().unwrap_or_else(|| default_subject(now)),
            text: body.text,
            html: body.html,
        };

        let started = Instant::now();
        guarded_call(&self.breaker, &self.send_policy, "Email send", || mailer.send(&email)).await?;
        info!(
            to = %to,
            count = codes.len(),
            endpoint = %settings.endpoint(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "email sent"
        );
        Ok(())
    }

    /// Send a single synthetic `TEST123` code to `to` through the normal send path.
    pub async fn send_test_email(&self, user_id: &str, to: &str) -> DeliveryResult {
        let code = Code {
            id: "test-1".to_string(),
            session_id: "test-session".to_string(),
            column_a_value: Some("Test code".to_string()),
            column_d_value: None,
            combined_code: "TEST123".to_string(),
            row_number: 1,
            status: CodeStatus::Available,
            sent_at: None,
            archived_at: None,
            created_at: Utc::now().to_rfc3339(),
        };
        let options = SendOptions {
            custom_message: Some("This is a test email to verify your settings.".to_string()),
            subject: Some(format!("Configuration test - {}", self.service_name)),
        };
        self.send_codes(user_id, std::slice::from_ref(&code), to, &options).await
    }

    async fn probe(&self, user_id: &str) -> (ConnectivityTestResult, bool) {
        let started = Instant::now();
        let details = ConnectivityDetails::new(ServiceType::Email);

        let creds = match self.credentials.email_credentials(user_id).await {
            Ok(Some(creds)) => creds,
            Ok(None) => {
                let result = ConnectivityTestResult::failed(
                    "Email settings not found",
                    details
                        .with_error_code(diagnostics::CONFIG_NOT_FOUND)
                        .with_suggestions(diagnostics::config_not_found()),
                );
                return (result, false);
            }
            Err(e) => {
                let result = ConnectivityTestResult::failed(
                    format!("stored email settings could not be read: {e}"),
                    details
                        .with_error_code(e.code())
                        .with_suggestions(["Save the SMTP credentials again"]),
                );
                return (result, false);
            }
        };

        let problems = diagnostics::validate(&creds);
        if !problems.is_empty() {
            let result = ConnectivityTestResult::failed(
                "Invalid configuration",
                details
                    .with_error_code(diagnostics::INVALID_CONFIG)
                    .with_suggestions(problems),
            );
            return (result, false);
        }

        let settings = match SmtpSettings::from_credentials(&creds, self.connection_timeout) {
            Ok(settings) => settings,
            Err(e) => {
                let result = ConnectivityTestResult::failed(
                    e.to_string(),
                    details
                        .with_error_code(diagnostics::INVALID_CONFIG)
                        .with_suggestions([e.to_string()]),
                );
                return (result, false);
            }
        };

        let mailers = &self.mailers;
        let target = &settings;
        let verified = retry_with_timeout(
            || async move {
                let mailer = mailers.connect(target)?;
                mailer.verify().await
            },
            &self.test_policy.retry,
            self.test_policy.timeout,
            "Email configuration test",
        )
        .await;
        let elapsed = started.elapsed().as_millis() as u64;
        let details = details.with_response_time(elapsed);

        let result = match verified {
            Ok(()) => ConnectivityTestResult::passed(
                format!(
                    "SMTP connection established! Server: {}:{}",
                    creds.smtp_host, creds.smtp_port
                ),
                details
                    .with_endpoint(settings.endpoint())
                    .with_suggestions(diagnostics::connected()),
            ),
            Err(e) => {
                warn!(user_id, error = %e, "smtp configuration test failed");
                let (code, suggestions) = diagnostics::classify_failure(&e, settings.preset);
                ConnectivityTestResult::failed(
                    e.root().to_string(),
                    details
                        .with_endpoint(settings.endpoint())
                        .with_error_code(code)
                        .with_suggestions(suggestions),
                )
            }
        };
        (result, true)
    }
}

#[async_trait]
impl DeliveryAdapter for EmailAdapter {
    fn service_type(&self) -> ServiceType {
        ServiceType::Email
    }

    async fn send_codes(
        &self,
        user_id: &str,
        codes: &[Code],
        destination: &str,
        options: &SendOptions,
    ) -> DeliveryResult {
        match self.deliver(user_id, codes, destination, options).await {
            Ok(()) => DeliveryResult::delivered(codes.len()),
            Err(e) => {
                warn!(user_id, error = %e, count = codes.len(), "email send failed");
                DeliveryResult::failed(codes.len(), e.to_string())
            }
        }
    }

    async fn test_configuration(&self, user_id: &str) -> ConnectivityTestResult {
        let (result, reached_server) = self.probe(user_id).await;
        if reached_server
            && let Err(e) = self.credentials.mark_tested(user_id, ServiceType::Email).await
        {
            warn!(user_id, error = %e, "failed to record email test time");
        }
        result
    }
}
