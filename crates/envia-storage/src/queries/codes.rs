// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code ingestion and read queries. Status changes live in
//! [`lifecycle`](super::lifecycle).

use envia_core::{Code, CodeStatus, EnviaError, NewCode};
use rusqlite::{params, params_from_iter};

use crate::database::{map_tr_err, Database};
use crate::models::{page_offset, ArchivedCode, Page};
use crate::queries::{parse_column, placeholders, IN_CHUNK};

pub(crate) const CODE_COLUMNS: &str = "c.id, c.session_id, c.column_a_value, c.column_d_value, \
     c.combined_code, c.row_number, c.status, c.sent_at, c.archived_at, c.created_at";

pub(crate) fn code_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Code> {
    Ok(Code {
        id: row.get(0)?,
        session_id: row.get(1)?,
        column_a_value: row.get(2)?,
        column_d_value: row.get(3)?,
        combined_code: row.get(4)?,
        row_number: row.get(5)?,
        status: parse_column(row, 6)?,
        sent_at: row.get(7)?,
        archived_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Load codes by id, `IN_CHUNK` ids per statement. Unknown ids are skipped.
fn select_by_ids(conn: &rusqlite::Connection, ids: &[String]) -> rusqlite::Result<Vec<Code>> {
    let mut found = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK) {
        let mut stmt = conn.prepare(&format!(
            "SELECT {CODE_COLUMNS} FROM codes c WHERE c.id IN ({})",
            placeholders(chunk.len())
        ))?;
        for code in stmt.query_map(params_from_iter(chunk.iter()), code_from_row)? {
            found.push(code?);
        }
    }
    Ok(found)
}

/// Insert ingested codes into a session as `available`, in one transaction.
/// Returns them in row order.
pub async fn insert_codes(
    db: &Database,
    session_id: &str,
    codes: &[NewCode],
) -> Result<Vec<Code>, EnviaError> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }
    let session_id = session_id.to_string();
    let codes = codes.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<Code>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(codes.len());
            {
                let mut insert = tx.prepare(
                    "INSERT INTO codes (id, session_id, column_a_value, column_d_value, combined_code, row_number)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for code in &codes {
                    let id = uuid::Uuid::new_v4().to_string();
                    insert.execute(params![
                        id,
                        session_id,
                        code.column_a_value,
                        code.column_d_value,
                        code.combined_code,
                        code.row_number,
                    ])?;
                    ids.push(id);
                }
            }
            let mut inserted = select_by_ids(&tx, &ids)?;
            inserted.sort_by_key(|c| c.row_number);
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_code(db: &Database, id: &str) -> Result<Option<Code>, EnviaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Code>, rusqlite::Error> {
            let result = conn.query_row(
                &format!("SELECT {CODE_COLUMNS} FROM codes c WHERE c.id = ?1"),
                params![id],
                code_from_row,
            );
            match result {
                Ok(code) => Ok(Some(code)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Codes with the given ids, in no particular order. Unknown ids are skipped.
pub async fn get_codes(db: &Database, ids: &[String]) -> Result<Vec<Code>, EnviaError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| -> Result<Vec<Code>, rusqlite::Error> {
            select_by_ids(conn, &ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Codes of a session in row order, optionally filtered by status.
pub async fn list_codes_by_session(
    db: &Database,
    session_id: &str,
    status: Option<CodeStatus>,
) -> Result<Vec<Code>, EnviaError> {
    let session_id = session_id.to_string();
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| -> Result<Vec<Code>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CODE_COLUMNS} FROM codes c
                 WHERE c.session_id = ?1 AND (?2 IS NULL OR c.status = ?2)
                 ORDER BY c.row_number ASC"
            ))?;
            let rows = stmt.query_map(params![session_id, status], code_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Archived codes across all of a user's sessions, most recently archived first.
pub async fn list_archived_codes(
    db: &Database,
    user_id: &str,
    page: u32,
    limit: u32,
) -> Result<Page<ArchivedCode>, EnviaError> {
    let user_id = user_id.to_string();
    let offset = page_offset(page, limit);
    let (items, total) = db
        .connection()
        .call(move |conn| -> Result<(Vec<ArchivedCode>, i64), rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CODE_COLUMNS}, s.filename, s.created_at
                 FROM codes c JOIN upload_sessions s ON c.session_id = s.id
                 WHERE s.user_id = ?1 AND c.status = 'archived'
                 ORDER BY c.archived_at DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let items = stmt
                .query_map(params![user_id, limit, offset], |row| {
                    Ok(ArchivedCode {
                        code: code_from_row(row)?,
                        filename: row.get(10)?,
                        session_created_at: row.get(11)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM codes c JOIN upload_sessions s ON c.session_id = s.id
                 WHERE s.user_id = ?1 AND c.status = 'archived'",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok((items, total))
        })
        .await
        .map_err(map_tr_err)?;

    Ok(Page::new(items, total, page.max(1), limit))
}
