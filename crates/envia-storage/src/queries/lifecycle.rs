// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code status transitions.
//!
//! Every transition runs in one transaction:
//! 1. load the code together with the owning session's user,
//! 2. check ownership and the lifecycle edge,
//! 3. compare-and-swap `UPDATE ... WHERE id = ? AND status = ?expected`,
//! 4. append the history row.
//!
//! A CAS that matches no row means another writer moved the code first; it
//! is reported as [`EnviaError::InvalidTransition`], never silently skipped.
//! [`mark_sent`] is the exception: delivery already happened, so such codes
//! are returned as [`SendConflict`]s alongside the codes that were moved.

use envia_core::{
    check_transition, ArchiveOutcome, Code, CodeStatus, EnviaError, HistoryAction, HistoryStatus,
    NewHistoryItem, ServiceType,
};
use rusqlite::{params, Transaction};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::database::{map_tr_err, Database};
use crate::models::{ArchiveStats, SendConflict, SentBatch};
use crate::queries::codes::{code_from_row, CODE_COLUMNS};
use crate::queries::history::insert_in;

/// Which statuses an archive request accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Only codes that were delivered (automatic archival after sending).
    SentOnly,
    /// Any code the lifecycle allows to be archived (`available` or `sent`).
    Any,
}

impl ArchiveMode {
    fn accepts(self, status: CodeStatus) -> bool {
        match self {
            ArchiveMode::SentOnly => status == CodeStatus::Sent,
            ArchiveMode::Any => status.can_transition_to(CodeStatus::Archived),
        }
    }
}

/// Result of a transaction body: domain failures are returned as the inner
/// `Err` so the transaction is dropped (rolled back) without a SQL error.
type TxResult<T> = Result<Result<T, EnviaError>, rusqlite::Error>;

/// Load a code and the user owning its session.
fn load_with_owner(tx: &Transaction<'_>, code_id: &str) -> rusqlite::Result<Option<(Code, String)>> {
    let result = tx.query_row(
        &format!(
            "SELECT {CODE_COLUMNS}, s.user_id
             FROM codes c JOIN upload_sessions s ON c.session_id = s.id
             WHERE c.id = ?1"
        ),
        params![code_id],
        |row| Ok((code_from_row(row)?, row.get::<_, String>(10)?)),
    );
    match result {
        Ok(found) => Ok(Some(found)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Ownership check shared by every transition.
fn owned_code(tx: &Transaction<'_>, user_id: &str, code_id: &str) -> TxResult<Code> {
    Ok(match load_with_owner(tx, code_id)? {
        None => Err(EnviaError::NotFound {
            entity: "code",
            id: code_id.to_string(),
        }),
        Some((_, owner)) if owner != user_id => Err(EnviaError::AccessDenied {
            entity: "code",
            id: code_id.to_string(),
        }),
        Some((code, _)) => Ok(code),
    })
}

/// CAS update of one code. Returns false when the stored status no longer
/// matches `from`.
fn swap_status(
    tx: &Transaction<'_>,
    user_id: &str,
    code_id: &str,
    from: CodeStatus,
    to: CodeStatus,
) -> rusqlite::Result<bool> {
    let timestamps = match to {
        CodeStatus::Sent => "sent_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        CodeStatus::Archived => "archived_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        CodeStatus::Available => "archived_at = NULL",
    };
    let changed = tx.execute(
        &format!(
            "UPDATE codes SET status = ?1, {timestamps}
             WHERE id = ?2 AND status = ?3
               AND session_id IN (SELECT id FROM upload_sessions WHERE user_id = ?4)"
        ),
        params![to.to_string(), code_id, from.to_string(), user_id],
    )?;
    Ok(changed == 1)
}

fn reload(tx: &Transaction<'_>, code_id: &str) -> rusqlite::Result<Code> {
    tx.query_row(
        &format!("SELECT {CODE_COLUMNS} FROM codes c WHERE c.id = ?1"),
        params![code_id],
        code_from_row,
    )
}

/// Move one owned code along `from -> to` and write its history row.
fn transition(
    tx: &Transaction<'_>,
    user_id: &str,
    code: &Code,
    to: CodeStatus,
    history: NewHistoryItem,
) -> TxResult<Code> {
    if let Err(e) = check_transition(&code.id, code.status, to) {
        return Ok(Err(e));
    }
    if !swap_status(tx, user_id, &code.id, code.status, to)? {
        return Ok(Err(EnviaError::InvalidTransition {
            code_id: code.id.clone(),
            from: code.status,
            to,
        }));
    }
    insert_in(tx, &history)?;
    Ok(Ok(reload(tx, &code.id)?))
}

fn archive_details(code: &Code, reason: &str) -> String {
    json!({
        "reason": reason,
        "code": code.combined_code,
        "description": code.description().unwrap_or(&code.combined_code),
        "previous_status": code.status,
    })
    .to_string()
}

/// Load the caller's codes in the order given, failing on the first missing
/// or foreign id. Used to validate a send before any network call.
pub async fn load_owned_codes(
    db: &Database,
    user_id: &str,
    code_ids: &[String],
) -> Result<Vec<Code>, EnviaError> {
    let user_id = user_id.to_string();
    let code_ids = code_ids.to_vec();
    db.connection()
        .call(move |conn| -> TxResult<Vec<Code>> {
            let tx = conn.transaction()?;
            let mut codes = Vec::with_capacity(code_ids.len());
            for id in &code_ids {
                match owned_code(&tx, &user_id, id)? {
                    Ok(code) => codes.push(code),
                    Err(e) => return Ok(Err(e)),
                }
            }
            Ok(Ok(codes))
        })
        .await
        .map_err(map_tr_err)?
}

fn send_history(
    user_id: &str,
    code_id: &str,
    service: ServiceType,
    destination: &str,
    details: serde_json::Value,
) -> NewHistoryItem {
    NewHistoryItem {
        user_id: user_id.to_string(),
        code_id: Some(code_id.to_string()),
        action_type: HistoryAction::for_send(service),
        destination: Some(destination.to_string()),
        status: HistoryStatus::Success,
        details: Some(details.to_string()),
    }
}

/// Record a delivered batch: `available -> sent` for every code that still
/// matches, one `success` send history row per code either way.
///
/// The messages are already out, so a code that changed concurrently (or
/// was removed) does not undo the rest; it is returned as a
/// [`SendConflict`] with its history row noting the status it was found in.
/// A foreign code is a caller error and rolls the whole call back.
pub async fn mark_sent(
    db: &Database,
    user_id: &str,
    code_ids: &[String],
    service: ServiceType,
    destination: &str,
) -> Result<SentBatch, EnviaError> {
    let user_id = user_id.to_string();
    let code_ids = code_ids.to_vec();
    let destination = destination.to_string();
    let batch = db
        .connection()
        .call(move |conn| -> TxResult<SentBatch> {
            let tx = conn.transaction()?;
            let mut batch = SentBatch::default();
            for id in &code_ids {
                let code = match owned_code(&tx, &user_id, id)? {
                    Ok(code) => code,
                    Err(EnviaError::NotFound { .. }) => {
                        let details = json!({ "service": service, "status_conflict": "missing" });
                        insert_in(&tx, &send_history(&user_id, id, service, &destination, details))?;
                        batch.conflicts.push(SendConflict {
                            code_id: id.clone(),
                            combined_code: None,
                            current: None,
                        });
                        continue;
                    }
                    Err(e) => return Ok(Err(e)),
                };
                let details = json!({ "code": code.combined_code, "service": service });
                let history = send_history(&user_id, &code.id, service, &destination, details);
                match transition(&tx, &user_id, &code, CodeStatus::Sent, history)? {
                    Ok(updated) => batch.sent.push(updated),
                    Err(_) => {
                        let details = json!({
                            "code": code.combined_code,
                            "service": service,
                            "status_conflict": code.status,
                        });
                        insert_in(&tx, &send_history(&user_id, &code.id, service, &destination, details))?;
                        batch.conflicts.push(SendConflict {
                            code_id: code.id.clone(),
                            combined_code: Some(code.combined_code.clone()),
                            current: Some(code.status),
                        });
                    }
                }
            }
            tx.commit()?;
            Ok(Ok(batch))
        })
        .await
        .map_err(map_tr_err)??;

    if !batch.conflicts.is_empty() {
        warn!(
            conflicts = batch.conflicts.len(),
            service = %service,
            "delivered codes changed status during the send"
        );
    }
    info!(count = batch.sent.len(), service = %service, "codes marked sent");
    Ok(batch)
}

/// Archive several codes. Each code succeeds or fails on its own; failures
/// are collected as messages and never roll back the others.
pub async fn archive_codes(
    db: &Database,
    user_id: &str,
    code_ids: &[String],
    mode: ArchiveMode,
    reason: &str,
) -> Result<ArchiveOutcome, EnviaError> {
    let user_id = user_id.to_string();
    let code_ids = code_ids.to_vec();
    let reason = reason.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<ArchiveOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut archived_count = 0;
            let mut errors = Vec::new();

            for id in &code_ids {
                let code = match owned_code(&tx, &user_id, id)? {
                    Ok(code) => code,
                    Err(e) => {
                        errors.push(e.to_string());
                        continue;
                    }
                };
                if !mode.accepts(code.status) {
                    errors.push(format!(
                        "code {} cannot be archived (status: {})",
                        code.combined_code, code.status
                    ));
                    continue;
                }
                let history = NewHistoryItem {
                    user_id: user_id.clone(),
                    code_id: Some(code.id.clone()),
                    action_type: HistoryAction::Archive,
                    destination: None,
                    status: HistoryStatus::Success,
                    details: Some(archive_details(&code, &reason)),
                };
                match transition(&tx, &user_id, &code, CodeStatus::Archived, history)? {
                    Ok(_) => archived_count += 1,
                    Err(e) => errors.push(e.to_string()),
                }
            }

            tx.commit()?;
            Ok(ArchiveOutcome {
                success: errors.is_empty(),
                archived_count,
                errors,
            })
        })
        .await
        .map_err(map_tr_err)?;

    debug!(
        archived = outcome.archived_count,
        failed = outcome.errors.len(),
        "archive request processed"
    );
    Ok(outcome)
}

/// Archive every `sent` code of one of the caller's sessions.
pub async fn archive_session(
    db: &Database,
    user_id: &str,
    session_id: &str,
    reason: &str,
) -> Result<ArchiveOutcome, EnviaError> {
    let session = crate::queries::sessions::get_session(db, session_id).await?;
    if session.is_none_or(|s| s.user_id != user_id) {
        return Ok(ArchiveOutcome {
            success: false,
            archived_count: 0,
            errors: vec![format!("session {session_id} not found or access denied")],
        });
    }

    let sent = crate::queries::codes::list_codes_by_session(db, session_id, Some(CodeStatus::Sent))
        .await?;
    if sent.is_empty() {
        return Ok(ArchiveOutcome {
            success: true,
            archived_count: 0,
            errors: vec!["no sent codes to archive".to_string()],
        });
    }

    let ids: Vec<String> = sent.into_iter().map(|c| c.id).collect();
    archive_codes(db, user_id, &ids, ArchiveMode::SentOnly, reason).await
}

/// `archived -> available`, clearing `archived_at`.
pub async fn restore_code(db: &Database, user_id: &str, code_id: &str) -> Result<Code, EnviaError> {
    let user_id = user_id.to_string();
    let code_id = code_id.to_string();
    db.connection()
        .call(move |conn| -> TxResult<Code> {
            let tx = conn.transaction()?;
            let code = match owned_code(&tx, &user_id, &code_id)? {
                Ok(code) => code,
                Err(e) => return Ok(Err(e)),
            };
            let history = NewHistoryItem {
                user_id: user_id.clone(),
                code_id: Some(code.id.clone()),
                action_type: HistoryAction::Unarchive,
                destination: None,
                status: HistoryStatus::Success,
                details: Some(archive_details(&code, "restored from archive")),
            };
            let restored = match transition(&tx, &user_id, &code, CodeStatus::Available, history)? {
                Ok(code) => code,
                Err(e) => return Ok(Err(e)),
            };
            tx.commit()?;
            Ok(Ok(restored))
        })
        .await
        .map_err(map_tr_err)?
}

/// Archived-code counts: total, today, last 7 days, last 30 days.
pub async fn archive_stats(db: &Database, user_id: &str) -> Result<ArchiveStats, EnviaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<ArchiveStats, rusqlite::Error> {
            conn.query_row(
                "SELECT
                    COUNT(*),
                    COUNT(CASE WHEN date(c.archived_at) = date('now') THEN 1 END),
                    COUNT(CASE WHEN c.archived_at >= strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-7 days') THEN 1 END),
                    COUNT(CASE WHEN c.archived_at >= strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '-30 days') THEN 1 END)
                 FROM codes c JOIN upload_sessions s ON c.session_id = s.id
                 WHERE s.user_id = ?1 AND c.status = 'archived'",
                params![user_id],
                |row| {
                    Ok(ArchiveStats {
                        total_archived: row.get(0)?,
                        archived_today: row.get(1)?,
                        archived_this_week: row.get(2)?,
                        archived_this_month: row.get(3)?,
                    })
                },
            )
        })
        .await
        .map_err(map_tr_err)
}
