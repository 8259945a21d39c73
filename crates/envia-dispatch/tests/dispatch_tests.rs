// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end send and lifecycle flows against a temp database.

use std::sync::Arc;

use envia_config::{EmailConfig, RetryPolicyConfig, WhatsAppConfig};
use envia_core::{
    CodeStatus, ConnectivityDetails, ConnectivityTestResult, DeliveryAdapter, DeliveryResult,
    EnviaError, HistoryAction, HistoryStatus, SendOptions, ServiceType,
};
use envia_dispatch::{Dispatcher, OverallStatus, ServiceStatus};
use envia_email::EmailAdapter;
use envia_resilience::{CircuitBreaker, CircuitBreakerConfig};
use envia_storage::queries::{codes, history};
use envia_test_utils::credentials::{sample_email, sample_whatsapp};
use envia_test_utils::{RecordingMailer, StaticCredentials, TestDb};
use envia_whatsapp::WhatsAppAdapter;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PHONE_ID: &str = "106540352242922";

struct Harness {
    test_db: TestDb,
    dispatcher: Dispatcher,
    mailer: RecordingMailer,
}

fn breaker(name: &str) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(name, CircuitBreakerConfig::default()))
}

async fn harness(graph_url: &str, mailer: RecordingMailer) -> Harness {
    let test_db = TestDb::new().await.unwrap();
    let creds = Arc::new(
        StaticCredentials::new()
            .with_whatsapp("u1", sample_whatsapp())
            .with_email("u1", sample_email()),
    );
    let wa_config = WhatsAppConfig {
        api_base_url: graph_url.to_string(),
        send: RetryPolicyConfig::new(2, 10, 20, 2000),
        test: RetryPolicyConfig::new(1, 10, 20, 2000),
        ..WhatsAppConfig::default()
    };
    let whatsapp =
        WhatsAppAdapter::new(&wa_config, "EnviaCodigo", creds.clone(), breaker("whatsapp")).unwrap();
    let email_config = EmailConfig {
        send: RetryPolicyConfig::new(1, 10, 20, 2000),
        ..EmailConfig::default()
    };
    let email = EmailAdapter::new(
        &email_config,
        "EnviaCodigo",
        creds,
        breaker("email"),
        Arc::new(mailer.clone()),
    );
    let dispatcher = Dispatcher::new(test_db.db.clone(), Arc::new(whatsapp), Arc::new(email));
    Harness {
        test_db,
        dispatcher,
        mailer,
    }
}

fn ids(codes: &[envia_core::Code]) -> Vec<String> {
    codes.iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn whatsapp_send_marks_codes_sent_with_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{PHONE_ID}/messages")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "wamid.1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri(), RecordingMailer::new()).await;
    let (_, seeded) = h.test_db.seed_session("u1", &["A1", "B2", "C3"]).await.unwrap();

    let result = h
        .dispatcher
        .send(
            "u1",
            ServiceType::Whatsapp,
            &ids(&seeded),
            "(11) 99999-9999",
            &SendOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result, DeliveryResult::delivered(3));

    for code in &seeded {
        let stored = codes::get_code(&h.test_db.db, &code.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CodeStatus::Sent);
        assert!(stored.sent_at.is_some());
        let entries = history::list_for_code(&h.test_db.db, &code.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action_type, HistoryAction::SendWhatsapp);
        assert_eq!(entries[0].status, HistoryStatus::Success);
    }
}

#[tokio::test]
async fn failed_send_leaves_codes_available_and_logs_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid parameter", "code": 100}
        })))
        .mount(&server)
        .await;

    let h = harness(&server.uri(), RecordingMailer::new()).await;
    let (_, seeded) = h.test_db.seed_session("u1", &["A1", "B2"]).await.unwrap();

    let result = h
        .dispatcher
        .send(
            "u1",
            ServiceType::Whatsapp,
            &ids(&seeded),
            "+5511999999999",
            &SendOptions::default(),
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.failed_count, 2);

    for code in &seeded {
        let stored = codes::get_code(&h.test_db.db, &code.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CodeStatus::Available);
        let entries = history::list_for_code(&h.test_db.db, &code.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, HistoryStatus::Failed);
        assert!(entries[0].details.as_deref().unwrap().contains("Invalid parameter"));
    }
}

#[tokio::test]
async fn email_send_goes_through_the_mailer() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (_, seeded) = h.test_db.seed_session("u1", &["X9"]).await.unwrap();

    let options = SendOptions {
        custom_message: Some("Your voucher".to_string()),
        subject: Some("Voucher".to_string()),
    };
    let result = h
        .dispatcher
        .send("u1", ServiceType::Email, &ids(&seeded), "client@example.com", &options)
        .await
        .unwrap();
    assert!(result.success);

    let sent = h.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "client@example.com");
    assert_eq!(sent[0].subject, "Voucher");
    assert!(sent[0].text.contains("X9"));

    let stored = codes::get_code(&h.test_db.db, &seeded[0].id).await.unwrap().unwrap();
    assert_eq!(stored.status, CodeStatus::Sent);
    let stats = h.dispatcher.history_statistics("u1").await.unwrap();
    assert_eq!(stats.email_sent, 1);
}

#[tokio::test]
async fn sent_codes_cannot_be_sent_again() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (_, seeded) = h.test_db.seed_session("u1", &["A1"]).await.unwrap();
    let code_ids = ids(&seeded);

    h.dispatcher
        .send("u1", ServiceType::Email, &code_ids, "a@example.com", &SendOptions::default())
        .await
        .unwrap();
    let err = h
        .dispatcher
        .send("u1", ServiceType::Email, &code_ids, "a@example.com", &SendOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnviaError::InvalidTransition {
            from: CodeStatus::Sent,
            to: CodeStatus::Sent,
            ..
        }
    ));
    assert_eq!(h.mailer.sent_count().await, 1);
}

#[tokio::test]
async fn foreign_codes_are_rejected_before_any_delivery() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (_, mine) = h.test_db.seed_session("u1", &["A1"]).await.unwrap();
    let (_, theirs) = h.test_db.seed_session("u2", &["B1"]).await.unwrap();

    let mixed = vec![mine[0].id.clone(), theirs[0].id.clone()];
    let err = h
        .dispatcher
        .send("u1", ServiceType::Email, &mixed, "a@example.com", &SendOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EnviaError::AccessDenied { .. }));
    assert_eq!(h.mailer.sent_count().await, 0);

    let err = h
        .dispatcher
        .send(
            "u1",
            ServiceType::Email,
            &["missing".to_string()],
            "a@example.com",
            &SendOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EnviaError::NotFound { .. }));
}

#[tokio::test]
async fn malformed_requests_are_validation_errors() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (_, seeded) = h.test_db.seed_session("u1", &["A1"]).await.unwrap();
    let opts = SendOptions::default();

    let err = h
        .dispatcher
        .send("u1", ServiceType::Email, &[], "a@example.com", &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, EnviaError::Validation(_)));

    let twice = vec![seeded[0].id.clone(), seeded[0].id.clone()];
    let err = h
        .dispatcher
        .send("u1", ServiceType::Email, &twice, "a@example.com", &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, EnviaError::Validation(_)));

    let err = h
        .dispatcher
        .send("u1", ServiceType::Email, &ids(&seeded), "  ", &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, EnviaError::Validation(_)));
}

#[tokio::test]
async fn archive_and_restore_round_the_lifecycle() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (session, seeded) = h.test_db.seed_session("u1", &["A1", "B2"]).await.unwrap();

    h.dispatcher
        .send("u1", ServiceType::Email, &ids(&seeded[..1]), "a@example.com", &SendOptions::default())
        .await
        .unwrap();

    let outcome = h.dispatcher.archive_session("u1", &session.id, "campaign over").await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.archived_count, 1);

    let counts = h.dispatcher.session_status("u1", &session.id).await.unwrap();
    assert_eq!((counts.available, counts.sent, counts.archived), (1, 0, 1));

    let archived = h.dispatcher.archived_codes("u1", 1, 10).await.unwrap();
    assert_eq!(archived.total, 1);
    assert_eq!(archived.items[0].code.combined_code, "A1");

    let restored = h.dispatcher.restore_code("u1", &seeded[0].id).await;
    assert!(restored.success, "{}", restored.message);
    assert!(restored.message.contains("A1"));

    let again = h.dispatcher.restore_code("u1", &seeded[0].id).await;
    assert!(!again.success);

    let single = h.dispatcher.archive_code("u1", &seeded[1].id, "unused").await;
    assert!(single.success, "{}", single.message);

    let stats = h.dispatcher.archive_stats("u1").await.unwrap();
    assert_eq!(stats.total_archived, 1);
}

#[tokio::test]
async fn sessions_of_other_users_are_hidden() {
    let h = harness("http://127.0.0.1:9", RecordingMailer::new()).await;
    let (session, _) = h.test_db.seed_session("u2", &["A1"]).await.unwrap();

    let err = h.dispatcher.session_status("u1", &session.id).await.unwrap_err();
    assert!(matches!(err, EnviaError::AccessDenied { .. }));
    let err = h.dispatcher.session_status("u1", "nope").await.unwrap_err();
    assert!(matches!(err, EnviaError::NotFound { .. }));
}

struct FixedProbe(ServiceType, bool);

#[async_trait::async_trait]
impl DeliveryAdapter for FixedProbe {
    fn service_type(&self) -> ServiceType {
        self.0
    }

    async fn send_codes(
        &self,
        _user_id: &str,
        codes: &[envia_core::Code],
        _destination: &str,
        _options: &SendOptions,
    ) -> DeliveryResult {
        DeliveryResult::failed(codes.len(), "not used")
    }

    async fn test_configuration(&self, _user_id: &str) -> ConnectivityTestResult {
        let details = ConnectivityDetails::new(self.0);
        if self.1 {
            ConnectivityTestResult::passed("ok", details)
        } else {
            ConnectivityTestResult::failed("down", details)
        }
    }
}

#[tokio::test]
async fn connectivity_summary_reflects_both_services() {
    let db = TestDb::new().await.unwrap();
    let all_up = Dispatcher::new(
        db.db.clone(),
        Arc::new(FixedProbe(ServiceType::Whatsapp, true)),
        Arc::new(FixedProbe(ServiceType::Email, true)),
    );
    let report = all_up.test_connectivity("u1").await;
    assert_eq!(report.summary.overall_status, OverallStatus::AllConnected);

    let half = Dispatcher::new(
        db.db.clone(),
        Arc::new(FixedProbe(ServiceType::Whatsapp, true)),
        Arc::new(FixedProbe(ServiceType::Email, false)),
    );
    let report = half.test_connectivity("u1").await;
    assert_eq!(report.summary.whatsapp_status, ServiceStatus::Connected);
    assert_eq!(report.summary.email_status, ServiceStatus::Failed);
    assert_eq!(report.summary.overall_status, OverallStatus::PartialOrFailed);

    let json = serde_json::to_value(&report.summary).unwrap();
    assert_eq!(json["overall_status"], "partial_or_failed");
    assert_eq!(json["email_status"], "failed");
}

/// Archives the first code of the batch while the delivery is in flight,
/// then reports the whole batch delivered.
struct ArchivingMidSend {
    db: envia_storage::Database,
}

#[async_trait::async_trait]
impl DeliveryAdapter for ArchivingMidSend {
    fn service_type(&self) -> ServiceType {
        ServiceType::Email
    }

    async fn send_codes(
        &self,
        user_id: &str,
        codes: &[envia_core::Code],
        _destination: &str,
        _options: &SendOptions,
    ) -> DeliveryResult {
        envia_storage::queries::lifecycle::archive_codes(
            &self.db,
            user_id,
            &[codes[0].id.clone()],
            envia_storage::ArchiveMode::Any,
            "archived by another session",
        )
        .await
        .unwrap();
        DeliveryResult::delivered(codes.len())
    }

    async fn test_configuration(&self, _user_id: &str) -> ConnectivityTestResult {
        ConnectivityTestResult::passed("ok", ConnectivityDetails::new(ServiceType::Email))
    }
}

#[tokio::test]
async fn code_archived_during_delivery_is_reported_and_others_are_sent() {
    let db = TestDb::new().await.unwrap();
    let (_, seeded) = db.seed_session("u1", &["A1", "B2", "C3"]).await.unwrap();
    let dispatcher = Dispatcher::new(
        db.db.clone(),
        Arc::new(FixedProbe(ServiceType::Whatsapp, true)),
        Arc::new(ArchivingMidSend { db: db.db.clone() }),
    );

    let result = dispatcher
        .send("u1", ServiceType::Email, &ids(&seeded), "bob@example.com", &SendOptions::default())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.sent_count, 3);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("A1"));
    assert!(result.errors[0].contains("archived"));

    let raced = codes::get_code(&db.db, &seeded[0].id).await.unwrap().unwrap();
    assert_eq!(raced.status, CodeStatus::Archived);
    assert!(raced.sent_at.is_none());
    for code in &seeded[1..] {
        let stored = codes::get_code(&db.db, &code.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CodeStatus::Sent);
    }

    // Every delivered code carries its send row, the raced one included.
    for code in &seeded {
        let entries = history::list_for_code(&db.db, &code.id).await.unwrap();
        let sends: Vec<_> = entries
            .iter()
            .filter(|h| h.action_type == HistoryAction::SendEmail)
            .collect();
        assert_eq!(sends.len(), 1, "code {}", code.combined_code);
        assert_eq!(sends[0].status, HistoryStatus::Success);
    }
    let raced_actions: Vec<HistoryAction> = history::list_for_code(&db.db, &seeded[0].id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.action_type)
        .collect();
    assert!(raced_actions.contains(&HistoryAction::Archive));
}
