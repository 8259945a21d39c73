// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The caller-facing surface: send, archive, restore, history.
//!
//! A send is checked in full against the store before any network call:
//! every code must exist, belong to the caller, and be `available`. The
//! batch is then delivered by one adapter call and, only on success, moved
//! to `sent` in a single transaction. Codes that changed while the batch was
//! in flight keep their status and are reported in the delivery result.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use envia_core::{
    ArchiveOutcome, Code, CodeStatus, ConnectivityTestResult, DeliveryAdapter, DeliveryResult,
    EnviaError, HistoryAction, HistoryItem, HistoryStatus, NewHistoryItem, SendOptions,
    ServiceType, TransitionOutcome,
};
use envia_storage::queries::{codes, history, lifecycle, sessions};
use envia_storage::{
    ArchiveHistoryEntry, ArchiveMode, ArchiveStats, ArchivedCode, Database, HistoryStatistics,
    Page, SendConflict, SessionStatusCounts,
};

use crate::connectivity::{self, ConnectivityReport};

#[derive(Clone)]
pub struct Dispatcher {
    db: Database,
    whatsapp: Arc<dyn DeliveryAdapter>,
    email: Arc<dyn DeliveryAdapter>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        db: Database,
        whatsapp: Arc<dyn DeliveryAdapter>,
        email: Arc<dyn DeliveryAdapter>,
    ) -> Self {
        Self { db, whatsapp, email }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn adapter(&self, service: ServiceType) -> &dyn DeliveryAdapter {
        match service {
            ServiceType::Whatsapp => self.whatsapp.as_ref(),
            ServiceType::Email => self.email.as_ref(),
        }
    }

    /// Deliver `code_ids` to `destination` through `service`.
    ///
    /// Validation and ownership failures return `Err` before anything is
    /// sent. `Ok` carries the delivery outcome. On success every code still
    /// `available` is moved to `sent` and every code gets a send history row;
    /// codes that were archived, sent or removed concurrently are left as they
    /// are and listed in `errors` while `success` stays true. A store failure
    /// after delivery is logged and returned as `Err`.
    pub async fn send(
        &self,
        user_id: &str,
        service: ServiceType,
        code_ids: &[String],
        destination: &str,
        options: &SendOptions,
    ) -> Result<DeliveryResult, EnviaError> {
        if code_ids.is_empty() {
            return Err(EnviaError::Validation("at least one code id is required".to_string()));
        }
        if destination.trim().is_empty() {
            return Err(EnviaError::Validation("a destination is required".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = code_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(EnviaError::Validation(format!("code {dup} is listed more than once")));
        }

        let batch = lifecycle::load_owned_codes(&self.db, user_id, code_ids).await?;
        if let Some(code) = batch.iter().find(|c| c.status != CodeStatus::Available) {
            return Err(EnviaError::InvalidTransition {
                code_id: code.id.clone(),
                from: code.status,
                to: CodeStatus::Sent,
            });
        }

        let mut result = self
            .adapter(service)
            .send_codes(user_id, &batch, destination, options)
            .await;

        if result.success {
            let marked = lifecycle::mark_sent(&self.db, user_id, code_ids, service, destination)
                .await
                .inspect_err(|e| {
                    error!(
                        user_id,
                        service = %service,
                        error = %e,
                        "codes were delivered but their status could not be updated"
                    );
                })?;
            result
                .errors
                .extend(marked.conflicts.iter().map(SendConflict::describe));
            info!(
                user_id,
                service = %service,
                count = result.sent_count,
                marked = marked.sent.len(),
                "codes sent"
            );
        } else {
            self.record_failure(user_id, service, &batch, destination, &result).await;
        }
        Ok(result)
    }

    async fn record_failure(
        &self,
        user_id: &str,
        service: ServiceType,
        batch: &[Code],
        destination: &str,
        result: &DeliveryResult,
    ) {
        let reason = result.errors.join("; ");
        for code in batch {
            let item = NewHistoryItem {
                user_id: user_id.to_string(),
                code_id: Some(code.id.clone()),
                action_type: HistoryAction::for_send(service),
                destination: Some(destination.to_string()),
                status: HistoryStatus::Failed,
                details: Some(
                    json!({ "code": code.combined_code, "service": service, "error": reason })
                        .to_string(),
                ),
            };
            if let Err(e) = history::append(&self.db, item).await {
                warn!(code_id = %code.id, error = %e, "failed to record send failure");
            }
        }
    }

    /// Archive several codes; `available` and `sent` codes are both accepted.
    pub async fn archive_codes(
        &self,
        user_id: &str,
        code_ids: &[String],
        reason: &str,
    ) -> Result<ArchiveOutcome, EnviaError> {
        lifecycle::archive_codes(&self.db, user_id, code_ids, ArchiveMode::Any, reason).await
    }

    /// Archive only the `sent` codes among `code_ids`.
    pub async fn archive_sent_codes(
        &self,
        user_id: &str,
        code_ids: &[String],
        reason: &str,
    ) -> Result<ArchiveOutcome, EnviaError> {
        lifecycle::archive_codes(&self.db, user_id, code_ids, ArchiveMode::SentOnly, reason).await
    }

    pub async fn archive_code(&self, user_id: &str, code_id: &str, reason: &str) -> TransitionOutcome {
        match self.archive_codes(user_id, &[code_id.to_string()], reason).await {
            Ok(outcome) if outcome.success => TransitionOutcome {
                success: true,
                message: "Code archived".to_string(),
            },
            Ok(outcome) => TransitionOutcome {
                success: false,
                message: outcome.errors.join("; "),
            },
            Err(e) => failed_transition(e),
        }
    }

    pub async fn archive_session(
        &self,
        user_id: &str,
        session_id: &str,
        reason: &str,
    ) -> Result<ArchiveOutcome, EnviaError> {
        lifecycle::archive_session(&self.db, user_id, session_id, reason).await
    }

    /// `archived -> available`.
    pub async fn restore_code(&self, user_id: &str, code_id: &str) -> TransitionOutcome {
        match lifecycle::restore_code(&self.db, user_id, code_id).await {
            Ok(code) => {
                info!(user_id, code_id, "code restored");
                TransitionOutcome {
                    success: true,
                    message: format!("Code {} restored to available", code.combined_code),
                }
            }
            Err(e) => failed_transition(e),
        }
    }

    pub async fn test_configuration(&self, user_id: &str, service: ServiceType) -> ConnectivityTestResult {
        self.adapter(service).test_configuration(user_id).await
    }

    pub async fn test_connectivity(&self, user_id: &str) -> ConnectivityReport {
        connectivity::test_all(self.whatsapp.as_ref(), self.email.as_ref(), user_id).await
    }

    pub async fn history(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HistoryItem>, EnviaError> {
        history::list_for_user(&self.db, user_id, limit, offset).await
    }

    pub async fn history_statistics(&self, user_id: &str) -> Result<HistoryStatistics, EnviaError> {
        history::statistics(&self.db, user_id).await
    }

    pub async fn archived_codes(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<ArchivedCode>, EnviaError> {
        codes::list_archived_codes(&self.db, user_id, page, limit).await
    }

    pub async fn archive_history(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<ArchiveHistoryEntry>, EnviaError> {
        history::archive_history(&self.db, user_id, page, limit).await
    }

    pub async fn archive_stats(&self, user_id: &str) -> Result<ArchiveStats, EnviaError> {
        lifecycle::archive_stats(&self.db, user_id).await
    }

    /// Code counts per status for one of the caller's sessions.
    pub async fn session_status(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionStatusCounts, EnviaError> {
        match sessions::get_session(&self.db, session_id).await? {
            Some(session) if session.user_id == user_id => {
                sessions::count_codes_by_status(&self.db, session_id).await
            }
            Some(_) => Err(EnviaError::AccessDenied {
                entity: "session",
                id: session_id.to_string(),
            }),
            None => Err(EnviaError::NotFound {
                entity: "session",
                id: session_id.to_string(),
            }),
        }
    }
}

fn failed_transition(e: EnviaError) -> TransitionOutcome {
    TransitionOutcome {
        success: false,
        message: e.to_string(),
    }
}
