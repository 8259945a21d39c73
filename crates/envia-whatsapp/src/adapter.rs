// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp implementation of [`DeliveryAdapter`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, warn};

use envia_config::WhatsAppConfig;
use envia_core::{
    Code, ConnectivityDetails, ConnectivityTestResult, CredentialProvider, DeliveryAdapter,
    DeliveryResult, EnviaError, SendOptions, ServiceType, WhatsAppCredentials,
};
use envia_resilience::{guarded_call, retry_with_timeout, CallPolicy, CircuitBreaker};

use crate::client::{classify_status, GraphClient};
use crate::diagnostics;
use crate::message::{default_footer, format_message};
use crate::phone::prepare_destination;
use crate::types::PhoneNumberInfo;

pub struct WhatsAppAdapter {
    client: GraphClient,
    credentials: Arc<dyn CredentialProvider>,
    breaker: Arc<CircuitBreaker>,
    token_prefixes: Vec<String>,
    default_country_code: String,
    footer: String,
    send_policy: CallPolicy,
    test_policy: CallPolicy,
}

impl std::fmt::Debug for WhatsAppAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppAdapter")
            .field("client", &self.client)
            .field("breaker", &self.breaker.name())
            .finish_non_exhaustive()
    }
}

impl WhatsAppAdapter {
    pub fn new(
        config: &WhatsAppConfig,
        service_name: &str,
        credentials: Arc<dyn CredentialProvider>,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, EnviaError> {
        Ok(Self {
            client: GraphClient::new(&config.api_base_url)?,
            credentials,
            breaker,
            token_prefixes: config.token_prefixes.clone(),
            default_country_code: config.default_country_code.clone(),
            footer: config
                .message_footer
                .clone()
                .unwrap_or_else(|| default_footer(service_name)),
            send_policy: CallPolicy::from(&config.send),
            test_policy: CallPolicy::from(&config.test),
        })
    }

    async fn require_credentials(&self, user_id: &str) -> Result<WhatsAppCredentials, EnviaError> {
        self.credentials
            .whatsapp_credentials(user_id)
            .await?
            .ok_or_else(|| {
                EnviaError::Config(
                    "WhatsApp settings not found, configure them in settings first".to_string(),
                )
            })
    }

    fn has_known_prefix(&self, token: &str) -> bool {
        self.token_prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }

    /// Send the batch as a single message. Returns the provider message id.
    async fn deliver(
        &self,
        user_id: &str,
        codes: &[Code],
        destination: &str,
        options: &SendOptions,
    ) -> Result<String, EnviaError> {
        if codes.is_empty() {
            return Err(EnviaError::Validation("no codes to send".to_string()));
        }
        let creds = self.require_credentials(user_id).await?;
        let to = prepare_destination(destination, &self.default_country_code)?;
        let body = format_message(codes, options.custom_message.as_deref(), &self.footer);

        let started = Instant::now();
        let message_id = guarded_call(&self.breaker, &self.send_policy, "WhatsApp send", || {
            self.client
                .send_text(&creds.access_token, &creds.phone_number_id, &to, &body)
        })
        .await?;
        info!(
            to = %to,
            count = codes.len(),
            message_id = %message_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "whatsapp message sent"
        );
        Ok(message_id)
    }

    /// Display number and verified business name of the configured number.
    pub async fn phone_number_info(&self, user_id: &str) -> Result<PhoneNumberInfo, EnviaError> {
        let creds = self.require_credentials(user_id).await?;
        let lookup = self
            .client
            .lookup_phone_number(&creds.access_token, &creds.phone_number_id)
            .await?;
        if lookup.is_success() {
            Ok(lookup.info.unwrap_or_default())
        } else {
            let status = reqwest::StatusCode::from_u16(lookup.status)
                .unwrap_or(reqwest::StatusCode::BAD_GATEWAY);
            Err(classify_status(
                status,
                format!(
                    "failed to fetch phone number info: HTTP {}: {}",
                    lookup.status,
                    lookup.error_message.unwrap_or_default()
                ),
            ))
        }
    }

    async fn probe(&self, user_id: &str) -> ConnectivityTestResult {
        let started = Instant::now();
        let details = ConnectivityDetails::new(ServiceType::Whatsapp);

        let creds = match self.credentials.whatsapp_credentials(user_id).await {
            Ok(Some(creds)) => creds,
            Ok(None) => {
                return ConnectivityTestResult::failed(
                    "WhatsApp settings not found",
                    details
                        .with_error_code(diagnostics::CONFIG_NOT_FOUND)
                        .with_suggestions(diagnostics::config_not_found()),
                );
            }
            Err(e) => {
                return ConnectivityTestResult::failed(
                    format!("stored WhatsApp settings could not be read: {e}"),
                    details
                        .with_error_code(e.code())
                        .with_suggestions(["Save the WhatsApp credentials again"]),
                );
            }
        };

        if !self.has_known_prefix(&creds.access_token) {
            return ConnectivityTestResult::failed(
                "Invalid access token format",
                details
                    .with_error_code(diagnostics::INVALID_TOKEN_FORMAT)
                    .with_suggestions(diagnostics::invalid_token_format(&self.token_prefixes)),
            );
        }

        let endpoint = self.client.phone_number_url(&creds.phone_number_id);
        let lookup = retry_with_timeout(
            || {
                self.client
                    .lookup_phone_number(&creds.access_token, &creds.phone_number_id)
            },
            &self.test_policy.retry,
            self.test_policy.timeout,
            "WhatsApp configuration test",
        )
        .await;
        let elapsed = started.elapsed().as_millis() as u64;

        match lookup {
            Ok(lookup) if lookup.is_success() => {
                let number = lookup
                    .info
                    .and_then(|i| i.display_phone_number)
                    .unwrap_or_else(|| "N/A".to_string());
                ConnectivityTestResult::passed(
                    format!("Connected successfully! Number: {number}"),
                    details
                        .with_endpoint(endpoint)
                        .with_response_time(elapsed)
                        .with_status_code(lookup.status)
                        .with_suggestions(diagnostics::connected()),
                )
            }
            Ok(lookup) => {
                let (code, suggestions) = diagnostics::for_status(lookup.status);
                ConnectivityTestResult::failed(
                    format!(
                        "Error {}: {}",
                        lookup.status,
                        lookup.error_message.unwrap_or_default()
                    ),
                    details
                        .with_endpoint(endpoint)
                        .with_response_time(elapsed)
                        .with_status_code(lookup.status)
                        .with_error_code(code)
                        .with_suggestions(suggestions),
                )
            }
            Err(e) => {
                warn!(error = %e, "whatsapp configuration test could not reach the API");
                ConnectivityTestResult::failed(
                    "Could not connect to the WhatsApp API",
                    details
                        .with_response_time(elapsed)
                        .with_error_code(diagnostics::CONNECTION_ERROR)
                        .with_suggestions(diagnostics::connection_error()),
                )
            }
        }
    }
}

#[async_trait]
impl DeliveryAdapter for WhatsAppAdapter {
    fn service_type(&self) -> ServiceType {
        ServiceType::Whatsapp
    }

    async fn send_codes(
        &self,
        user_id: &str,
        codes: &[Code],
        destination: &str,
        options: &SendOptions,
    ) -> DeliveryResult {
        match self.deliver(user_id, codes, destination, options).await {
            Ok(_) => DeliveryResult::delivered(codes.len()),
            Err(e) => {
                warn!(user_id, error = %e, count = codes.len(), "whatsapp send failed");
                DeliveryResult::failed(codes.len(), e.to_string())
            }
        }
    }

    async fn test_configuration(&self, user_id: &str) -> ConnectivityTestResult {
        let result = self.probe(user_id).await;
        if result.details.endpoint.is_some()
            || result.details.error_code.as_deref() == Some(diagnostics::CONNECTION_ERROR)
        {
            if let Err(e) = self
                .credentials
                .mark_tested(user_id, ServiceType::Whatsapp)
                .await
            {
                warn!(user_id, error = %e, "failed to record whatsapp test time");
            }
        }
        result
    }
}
