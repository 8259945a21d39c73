// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Business Graph API.
//!
//! One attempt per call. Retry, timeout, and circuit breaking are layered on
//! by the adapter; this client only classifies each response so the retry
//! layer can decide.

use reqwest::StatusCode;
use tracing::debug;

use envia_core::EnviaError;

use crate::types::{graph_error_message, PhoneNumberInfo, SendMessageRequest, SendMessageResponse};

#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
}

/// Raw outcome of a phone-number lookup. HTTP errors are data here, not `Err`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneLookup {
    pub status: u16,
    pub info: Option<PhoneNumberInfo>,
    pub error_message: Option<String>,
}

impl PhoneLookup {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl GraphClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, EnviaError> {
        let client = reqwest::Client::builder().build().map_err(|e| EnviaError::Transport {
            message: format!("failed to build HTTP client: {e}"),
            retryable: Some(false),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!("{}/{phone_number_id}/messages", self.base_url)
    }

    pub fn phone_number_url(&self, phone_number_id: &str) -> String {
        format!("{}/{phone_number_id}", self.base_url)
    }

    /// Send one text message. Returns the provider message id.
    pub async fn send_text(
        &self,
        access_token: &str,
        phone_number_id: &str,
        to: &str,
        body: &str,
    ) -> Result<String, EnviaError> {
        let response = self
            .client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(access_token)
            .json(&SendMessageRequest::text(to, body))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let text = response.text().await.map_err(request_error)?;
        debug!(status = %status, "graph send response received");

        if status.is_success() {
            let message_id = serde_json::from_str::<SendMessageResponse>(&text)
                .ok()
                .and_then(|r| r.messages)
                .and_then(|m| m.into_iter().next())
                .map(|m| m.id);
            return message_id.ok_or_else(|| {
                EnviaError::transport("graph API accepted the request but returned no message", Some(false))
            });
        }

        let detail = graph_error_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        Err(classify_status(status, format!("HTTP {}: {detail}", status.as_u16())))
    }

    /// GET the phone-number metadata endpoint.
    pub async fn lookup_phone_number(
        &self,
        access_token: &str,
        phone_number_id: &str,
    ) -> Result<PhoneLookup, EnviaError> {
        let response = self
            .client
            .get(self.phone_number_url(phone_number_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let text = response.text().await.map_err(request_error)?;
        if status.is_success() {
            Ok(PhoneLookup {
                status: status.as_u16(),
                info: serde_json::from_str(&text).ok(),
                error_message: None,
            })
        } else {
            Ok(PhoneLookup {
                status: status.as_u16(),
                info: None,
                error_message: Some(graph_error_message(&text).unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                })),
            })
        }
    }
}

/// 5xx, 429 and 408 are transient; 401/403 are authorization failures;
/// anything else is permanent.
pub fn classify_status(status: StatusCode, message: String) -> EnviaError {
    let code = status.as_u16();
    match code {
        401 | 403 => EnviaError::Authorization {
            message,
            status: Some(code),
        },
        408 | 429 | 500..=599 => EnviaError::transport(message, Some(true)),
        _ => EnviaError::transport(message, Some(false)),
    }
}

fn request_error(e: reqwest::Error) -> EnviaError {
    EnviaError::Transport {
        message: format!("connection error: {e}"),
        retryable: Some(true),
        source: Some(Box::new(e)),
    }
}
