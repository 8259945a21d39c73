// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Envia delivery core.
//!
//! This crate provides the error taxonomy, the code lifecycle rules, the
//! shared data types, and the trait seams implemented by the vault, the
//! delivery adapters, and test doubles.

pub mod error;
pub mod lifecycle;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EnviaError;
pub use types::{
    ArchiveOutcome, Code, CodeStatus, ConnectivityDetails, ConnectivityTestResult,
    DeliveryResult, EmailCredentials, HistoryAction, HistoryItem, HistoryStatus, NewCode,
    NewHistoryItem, SendOptions, ServiceType, TransitionOutcome, UploadSession,
    WhatsAppCredentials,
};

pub use lifecycle::check_transition;
pub use traits::{CredentialProvider, DeliveryAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_status_round_trips_through_strings() {
        use std::str::FromStr;

        for status in [CodeStatus::Available, CodeStatus::Sent, CodeStatus::Archived] {
            let s = status.to_string();
            assert_eq!(CodeStatus::from_str(&s).unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
    }

    #[test]
    fn history_action_uses_snake_case() {
        assert_eq!(HistoryAction::SendWhatsapp.to_string(), "send_whatsapp");
        assert_eq!(HistoryAction::for_send(ServiceType::Email), HistoryAction::SendEmail);
        let json = serde_json::to_string(&HistoryAction::Unarchive).unwrap();
        assert_eq!(json, "\"unarchive\"");
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let wa = WhatsAppCredentials {
            access_token: "EAAGsecret-token-value".into(),
            phone_number_id: "1234".into(),
            webhook_url: None,
        };
        let email = EmailCredentials {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            smtp_user: "user".into(),
            smtp_password: "hunter2".into(),
            from_email: "noreply@example.com".into(),
            from_name: None,
            use_ssl: None,
        };
        assert!(!format!("{wa:?}").contains("secret-token"));
        assert!(!format!("{email:?}").contains("hunter2"));
    }

    #[test]
    fn email_credentials_accept_missing_fields() {
        let creds: EmailCredentials = serde_json::from_str(r#"{"smtp_host":"h"}"#).unwrap();
        assert_eq!(creds.smtp_port, 0);
        assert!(creds.smtp_user.is_empty());
        assert!(!creds.secure());
    }

    #[test]
    fn description_skips_duplicate_column_a() {
        let mut code = Code {
            id: "1".into(),
            session_id: "s".into(),
            column_a_value: Some("ABC".into()),
            column_d_value: None,
            combined_code: "ABC".into(),
            row_number: 1,
            status: CodeStatus::Available,
            sent_at: None,
            archived_at: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        assert_eq!(code.description(), None);
        code.column_a_value = Some("Operator X".into());
        assert_eq!(code.description(), Some("Operator X"));
    }

    #[test]
    fn retry_exhausted_exposes_root_cause() {
        let err = EnviaError::RetryExhausted {
            operation: "send".into(),
            attempts: 3,
            last_error: Box::new(EnviaError::transport("connection reset", Some(true))),
        };
        assert_eq!(err.root().code(), "TRANSPORT_ERROR");
        assert!(err.to_string().contains("failed after 3 attempts"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn delivery_result_is_all_or_nothing() {
        let ok = DeliveryResult::delivered(3);
        assert_eq!((ok.sent_count, ok.failed_count), (3, 0));
        let bad = DeliveryResult::failed(3, "boom");
        assert_eq!((bad.sent_count, bad.failed_count), (0, 3));
        assert_eq!(bad.errors, vec!["boom".to_string()]);
    }
}
