// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw `api_settings` rows. Values are vault tokens; this module never sees
//! plaintext credentials.

use envia_core::{EnviaError, ServiceType};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::CredentialRecord;
use crate::queries::parse_column;

const CREDENTIAL_COLUMNS: &str =
    "id, user_id, service_type, encrypted_config, is_active, last_tested, created_at, updated_at";

fn credential_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_type: parse_column(row, 2)?,
        encrypted_config: row.get(3)?,
        is_active: row.get(4)?,
        last_tested: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert or replace the user's blob for `service`. Saving re-activates a
/// deactivated row and keeps its id.
pub async fn upsert(
    db: &Database,
    user_id: &str,
    service: ServiceType,
    encrypted_config: &str,
) -> Result<CredentialRecord, EnviaError> {
    let id = uuid::Uuid::new_v4().to_string();
    let user_id = user_id.to_string();
    let service = service.to_string();
    let encrypted_config = encrypted_config.to_string();
    db.connection()
        .call(move |conn| -> Result<CredentialRecord, rusqlite::Error> {
            conn.execute(
                "INSERT INTO api_settings (id, user_id, service_type, encrypted_config)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, service_type) DO UPDATE SET
                    encrypted_config = excluded.encrypted_config,
                    is_active = 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, user_id, service, encrypted_config],
            )?;
            conn.query_row(
                &format!(
                    "SELECT {CREDENTIAL_COLUMNS} FROM api_settings
                     WHERE user_id = ?1 AND service_type = ?2"
                ),
                params![user_id, service],
                credential_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The active row for (user, service), if any.
pub async fn find_active(
    db: &Database,
    user_id: &str,
    service: ServiceType,
) -> Result<Option<CredentialRecord>, EnviaError> {
    let user_id = user_id.to_string();
    let service = service.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<CredentialRecord>, rusqlite::Error> {
            let result = conn.query_row(
                &format!(
                    "SELECT {CREDENTIAL_COLUMNS} FROM api_settings
                     WHERE user_id = ?1 AND service_type = ?2 AND is_active = 1"
                ),
                params![user_id, service],
                credential_from_row,
            );
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// All active rows of a user, ordered by service.
pub async fn list_active(db: &Database, user_id: &str) -> Result<Vec<CredentialRecord>, EnviaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<CredentialRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM api_settings
                 WHERE user_id = ?1 AND is_active = 1 ORDER BY service_type"
            ))?;
            let rows = stmt.query_map(params![user_id], credential_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Soft delete. Returns whether an active row was deactivated.
pub async fn deactivate(
    db: &Database,
    user_id: &str,
    service: ServiceType,
) -> Result<bool, EnviaError> {
    let user_id = user_id.to_string();
    let service = service.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE api_settings
                 SET is_active = 0, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?1 AND service_type = ?2 AND is_active = 1",
                params![user_id, service],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Stamp `last_tested` after a configuration test, whatever its outcome.
pub async fn mark_tested(
    db: &Database,
    user_id: &str,
    service: ServiceType,
) -> Result<(), EnviaError> {
    let user_id = user_id.to_string();
    let service = service.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE api_settings SET last_tested = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE user_id = ?1 AND service_type = ?2",
                params![user_id, service],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
