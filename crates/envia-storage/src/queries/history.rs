// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit history. There is no update path; the schema rejects
//! UPDATE statements on `history_items`.

use envia_core::{EnviaError, HistoryItem, NewHistoryItem};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{page_offset, ArchiveHistoryEntry, HistoryStatistics, Page};
use crate::queries::parse_column;

pub(crate) const HISTORY_COLUMNS: &str =
    "h.id, h.user_id, h.code_id, h.action_type, h.destination, h.status, h.details, h.created_at";

pub(crate) fn history_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryItem> {
    Ok(HistoryItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        code_id: row.get(2)?,
        action_type: parse_column(row, 3)?,
        destination: row.get(4)?,
        status: parse_column(row, 5)?,
        details: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Insert inside an existing connection or transaction. Used by the
/// lifecycle queries so the audit row commits with the status change.
pub(crate) fn insert_in(
    conn: &rusqlite::Connection,
    item: &NewHistoryItem,
) -> rusqlite::Result<HistoryItem> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO history_items (id, user_id, code_id, action_type, destination, status, details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            item.user_id,
            item.code_id,
            item.action_type.to_string(),
            item.destination,
            item.status.to_string(),
            item.details,
        ],
    )?;
    conn.query_row(
        &format!("SELECT {HISTORY_COLUMNS} FROM history_items h WHERE h.id = ?1"),
        params![id],
        history_from_row,
    )
}

/// Append one history entry.
pub async fn append(db: &Database, item: NewHistoryItem) -> Result<HistoryItem, EnviaError> {
    db.connection()
        .call(move |conn| -> Result<HistoryItem, rusqlite::Error> { insert_in(conn, &item) })
        .await
        .map_err(map_tr_err)
}

/// A user's history, newest first.
pub async fn list_for_user(
    db: &Database,
    user_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<HistoryItem>, EnviaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<HistoryItem>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM history_items h
                 WHERE h.user_id = ?1 ORDER BY h.created_at DESC, h.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, limit, offset], history_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every entry that references a code, newest first.
pub async fn list_for_code(db: &Database, code_id: &str) -> Result<Vec<HistoryItem>, EnviaError> {
    let code_id = code_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<HistoryItem>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM history_items h
                 WHERE h.code_id = ?1 ORDER BY h.created_at DESC, h.rowid DESC"
            ))?;
            let rows = stmt.query_map(params![code_id], history_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Totals of successful sends and archives plus the ten latest entries.
pub async fn statistics(db: &Database, user_id: &str) -> Result<HistoryStatistics, EnviaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<HistoryStatistics, rusqlite::Error> {
            let (total_actions, whatsapp_sent, email_sent, archived_codes) = conn.query_row(
                "SELECT
                    COUNT(*),
                    COUNT(CASE WHEN action_type = 'send_whatsapp' AND status = 'success' THEN 1 END),
                    COUNT(CASE WHEN action_type = 'send_email' AND status = 'success' THEN 1 END),
                    COUNT(CASE WHEN action_type = 'archive' AND status = 'success' THEN 1 END)
                 FROM history_items WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM history_items h
                 WHERE h.user_id = ?1 ORDER BY h.created_at DESC, h.rowid DESC LIMIT 10"
            ))?;
            let recent_activity = stmt
                .query_map(params![user_id], history_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HistoryStatistics {
                total_actions,
                whatsapp_sent,
                email_sent,
                archived_codes,
                recent_activity,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Archive entries joined with their code and session, newest first.
pub async fn archive_history(
    db: &Database,
    user_id: &str,
    page: u32,
    limit: u32,
) -> Result<Page<ArchiveHistoryEntry>, EnviaError> {
    let user_id = user_id.to_string();
    let offset = page_offset(page, limit);
    let (items, total) = db
        .connection()
        .call(move |conn| -> Result<(Vec<ArchiveHistoryEntry>, i64), rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS}, c.combined_code, c.column_a_value, s.filename
                 FROM history_items h
                 LEFT JOIN codes c ON h.code_id = c.id
                 LEFT JOIN upload_sessions s ON c.session_id = s.id
                 WHERE h.user_id = ?1 AND h.action_type = 'archive'
                 ORDER BY h.created_at DESC, h.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let items = stmt
                .query_map(params![user_id, limit, offset], |row| {
                    Ok(ArchiveHistoryEntry {
                        item: history_from_row(row)?,
                        combined_code: row.get(8)?,
                        description: row.get(9)?,
                        filename: row.get(10)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM history_items WHERE user_id = ?1 AND action_type = 'archive'",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok((items, total))
        })
        .await
        .map_err(map_tr_err)?;

    Ok(Page::new(items, total, page.max(1), limit))
}

#[cfg(test)]
mod tests {
    use envia_core::{HistoryAction, HistoryStatus};

    use super::*;

    fn entry(user: &str, action: HistoryAction, status: HistoryStatus) -> NewHistoryItem {
        NewHistoryItem {
            user_id: user.to_string(),
            code_id: Some("code-1".to_string()),
            action_type: action,
            destination: None,
            status,
            details: None,
        }
    }

    async fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("h.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn statistics_count_only_successes() {
        let (db, _dir) = test_db().await;
        append(&db, entry("u1", HistoryAction::SendWhatsapp, HistoryStatus::Success)).await.unwrap();
        append(&db, entry("u1", HistoryAction::SendWhatsapp, HistoryStatus::Failed)).await.unwrap();
        append(&db, entry("u1", HistoryAction::SendEmail, HistoryStatus::Success)).await.unwrap();
        append(&db, entry("u1", HistoryAction::Archive, HistoryStatus::Success)).await.unwrap();
        append(&db, entry("u2", HistoryAction::SendEmail, HistoryStatus::Success)).await.unwrap();

        let stats = statistics(&db, "u1").await.unwrap();
        assert_eq!(stats.total_actions, 4);
        assert_eq!(stats.whatsapp_sent, 1);
        assert_eq!(stats.email_sent, 1);
        assert_eq!(stats.archived_codes, 1);
        assert_eq!(stats.recent_activity.len(), 4);
    }

    #[tokio::test]
    async fn newest_entries_come_first() {
        let (db, _dir) = test_db().await;
        let first = append(&db, entry("u1", HistoryAction::Archive, HistoryStatus::Success)).await.unwrap();
        let second = append(&db, entry("u1", HistoryAction::Unarchive, HistoryStatus::Success)).await.unwrap();

        let items = list_for_user(&db, "u1", 10, 0).await.unwrap();
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);

        let by_code = list_for_code(&db, "code-1").await.unwrap();
        assert_eq!(by_code.len(), 2);
    }

    #[tokio::test]
    async fn history_rows_cannot_be_updated() {
        let (db, _dir) = test_db().await;
        let item = append(&db, entry("u1", HistoryAction::SendEmail, HistoryStatus::Pending)).await.unwrap();

        let result = db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE history_items SET status = 'success' WHERE id = ?1",
                    params![item.id],
                )
            })
            .await;
        assert!(result.is_err());
    }
}
