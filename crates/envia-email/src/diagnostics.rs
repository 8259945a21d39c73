// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration checks and failure classification for SMTP tests.

use envia_core::{EmailCredentials, EnviaError};

use crate::presets::ProviderPreset;

pub const CONFIG_NOT_FOUND: &str = "CONFIG_NOT_FOUND";
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const AUTHENTICATION_ERROR: &str = "AUTHENTICATION_ERROR";
pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
pub const SSL_ERROR: &str = "SSL_ERROR";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Every problem with the stored settings, in field order.
pub fn validate(creds: &EmailCredentials) -> Vec<String> {
    let mut problems = Vec::new();
    if creds.smtp_host.trim().is_empty() {
        problems.push("SMTP server is required".to_string());
    }
    if !(1..=65_535).contains(&creds.smtp_port) {
        problems.push("Invalid SMTP port (must be between 1 and 65535)".to_string());
    }
    if creds.smtp_user.trim().is_empty() {
        problems.push("SMTP user is required".to_string());
    }
    if creds.smtp_password.is_empty() {
        problems.push("SMTP password is required".to_string());
    }
    if creds.from_email.trim().is_empty() {
        problems.push("Sender email is required".to_string());
    }
    problems
}

pub fn config_not_found() -> Vec<&'static str> {
    vec![
        "Configure your SMTP credentials",
        "Check that every required field was filled in",
    ]
}

pub fn connected() -> Vec<&'static str> {
    vec![
        "SMTP configuration is valid and working",
        "You can send codes via email",
        "We recommend sending a test email",
    ]
}

/// Classify a failed connection check into an error code with suggestions.
pub fn classify_failure(err: &EnviaError, preset: ProviderPreset) -> (&'static str, Vec<String>) {
    let root = err.root();
    let message = root.to_string().to_lowercase();

    if matches!(root, EnviaError::Authorization { .. }) || message.contains("auth") {
        let mut suggestions = vec![
            "Check that the SMTP user is correct".to_string(),
            "Confirm that the password is correct".to_string(),
        ];
        if let Some(hint) = preset.auth_hint() {
            suggestions.push(hint.to_string());
        }
        suggestions.push("Check whether two-factor authentication requires an app password".to_string());
        return (AUTHENTICATION_ERROR, suggestions);
    }

    if matches!(root, EnviaError::Timeout { .. })
        || ["connection", "timeout", "timed out", "refused"]
            .iter()
            .any(|p| message.contains(p))
    {
        return (
            CONNECTION_ERROR,
            vec![
                "Check that the SMTP server is correct".to_string(),
                "Confirm the port (587 for STARTTLS, 465 for SSL)".to_string(),
                "Check your internet connection".to_string(),
                "Make sure no firewall is blocking the connection".to_string(),
            ],
        );
    }

    if ["cert", "ssl", "tls"].iter().any(|p| message.contains(p)) {
        return (
            SSL_ERROR,
            vec![
                "SSL/TLS certificate problem".to_string(),
                "Try a different port (587 or 465)".to_string(),
                "Review the security settings of your provider".to_string(),
            ],
        );
    }

    (
        UNKNOWN_ERROR,
        vec![
            "Unknown error in the SMTP configuration".to_string(),
            "Review every field again".to_string(),
            "Consult your email provider's documentation".to_string(),
        ],
    )
}
