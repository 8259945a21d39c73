// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, adapters, storage, and dispatch layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a distribution code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Available,
    Sent,
    Archived,
}

/// External delivery service a credential or breaker belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Whatsapp,
    Email,
}

/// A single distribution code as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub id: String,
    pub session_id: String,
    pub column_a_value: Option<String>,
    pub column_d_value: Option<String>,
    pub combined_code: String,
    pub row_number: i64,
    pub status: CodeStatus,
    pub sent_at: Option<String>,
    pub archived_at: Option<String>,
    pub created_at: String,
}

impl Code {
    /// Optional description shown next to the code in outbound messages.
    ///
    /// Column A is only shown when it adds something beyond the combined code.
    pub fn description(&self) -> Option<&str> {
        self.column_a_value
            .as_deref()
            .filter(|a| !a.is_empty() && *a != self.combined_code)
    }
}

/// A code record produced by the spreadsheet ingestion step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCode {
    pub column_a_value: Option<String>,
    pub column_d_value: Option<String>,
    pub combined_code: String,
    pub row_number: i64,
}

/// An upload session groups the codes of one spreadsheet and ties them to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSession {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub total_codes: i64,
    pub valid_codes: i64,
    pub created_at: String,
}

/// Kind of action recorded in the audit history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    SendWhatsapp,
    SendEmail,
    Archive,
    Unarchive,
}

impl HistoryAction {
    /// History action recorded for a send through the given service.
    pub fn for_send(service: ServiceType) -> Self {
        match service {
            ServiceType::Whatsapp => Self::SendWhatsapp,
            ServiceType::Email => Self::SendEmail,
        }
    }
}

/// Outcome recorded on a history entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
    Pending,
}

/// Immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub user_id: String,
    pub code_id: Option<String>,
    pub action_type: HistoryAction,
    pub destination: Option<String>,
    pub status: HistoryStatus,
    pub details: Option<String>,
    pub created_at: String,
}

/// A history entry waiting to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryItem {
    pub user_id: String,
    pub code_id: Option<String>,
    pub action_type: HistoryAction,
    pub destination: Option<String>,
    pub status: HistoryStatus,
    pub details: Option<String>,
}

/// Decrypted WhatsApp Business API credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppCredentials {
    pub access_token: String,
    pub phone_number_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl std::fmt::Debug for WhatsAppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppCredentials")
            .field("access_token", &"[REDACTED]")
            .field("phone_number_id", &self.phone_number_id)
            .field("webhook_url", &self.webhook_url)
            .finish()
    }
}

/// Decrypted SMTP credentials.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCredentials {
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default)]
    pub smtp_port: u32,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ssl: Option<bool>,
}

impl EmailCredentials {
    /// Implicit TLS is used on the SMTPS port, STARTTLS everywhere else.
    pub fn secure(&self) -> bool {
        self.smtp_port == 465
    }
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Per-send presentation options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    /// Replaces the default message header.
    pub custom_message: Option<String>,
    /// Email subject; ignored by WhatsApp.
    pub subject: Option<String>,
}

/// Result of one batch delivery. Always all-or-nothing per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub sent_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl DeliveryResult {
    /// Every code in the batch was delivered.
    pub fn delivered(count: usize) -> Self {
        Self {
            success: true,
            sent_count: count,
            failed_count: 0,
            errors: Vec::new(),
        }
    }

    /// No code in the batch was delivered.
    pub fn failed(count: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            sent_count: 0,
            failed_count: count,
            errors: vec![error.into()],
        }
    }
}

/// Diagnostic details attached to a connectivity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityDetails {
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ConnectivityDetails {
    pub fn new(service_type: ServiceType) -> Self {
        Self {
            service_type,
            endpoint: None,
            response_time: None,
            status_code: None,
            error_code: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time = Some(millis);
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }
}

/// User-facing result of a configuration probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityTestResult {
    pub success: bool,
    pub message: String,
    pub details: ConnectivityDetails,
    pub timestamp: DateTime<Utc>,
}

impl ConnectivityTestResult {
    pub fn passed(message: impl Into<String>, details: ConnectivityDetails) -> Self {
        Self {
            success: true,
            message: message.into(),
            details,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>, details: ConnectivityDetails) -> Self {
        Self {
            success: false,
            message: message.into(),
            details,
            timestamp: Utc::now(),
        }
    }
}

/// Result of a single-code state transition requested by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub success: bool,
    pub message: String,
}

/// Result of a multi-code archive request; failures are reported per code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    pub success: bool,
    pub archived_count: usize,
    pub errors: Vec<String>,
}
