// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload session operations.

use envia_core::{EnviaError, UploadSession};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::SessionStatusCounts;

const SESSION_COLUMNS: &str = "id, user_id, filename, total_codes, valid_codes, created_at";

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UploadSession> {
    Ok(UploadSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        total_codes: row.get(3)?,
        valid_codes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Create a session owned by `user_id`.
pub async fn create_session(
    db: &Database,
    user_id: &str,
    filename: &str,
    total_codes: i64,
    valid_codes: i64,
) -> Result<UploadSession, EnviaError> {
    let id = uuid::Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    let filename = filename.to_string();
    db.connection()
        .call(move |conn| -> Result<UploadSession, rusqlite::Error> {
            conn.execute(
                "INSERT INTO upload_sessions (id, user_id, filename, total_codes, valid_codes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, user_id, filename, total_codes, valid_codes],
            )?;
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM upload_sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_session(db: &Database, id: &str) -> Result<Option<UploadSession>, EnviaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UploadSession>, rusqlite::Error> {
            let result = conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM upload_sessions WHERE id = ?1"),
                params![id],
                session_from_row,
            );
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent sessions first.
pub async fn list_sessions_for_user(
    db: &Database,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<UploadSession>, EnviaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<UploadSession>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM upload_sessions
                 WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, limit, offset], session_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_codes_by_status(
    db: &Database,
    session_id: &str,
) -> Result<SessionStatusCounts, EnviaError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<SessionStatusCounts, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM codes WHERE session_id = ?1 GROUP BY status",
            )?;
            let mut counts = SessionStatusCounts::default();
            let rows = stmt.query_map(params![session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (status, count) = row?;
                match status.as_str() {
                    "available" => counts.available = count,
                    "sent" => counts.sent = count,
                    "archived" => counts.archived = count,
                    _ => {}
                }
                counts.total += count;
            }
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}
