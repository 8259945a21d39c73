// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-file database with an upload session of seeded codes.

use envia_core::{Code, EnviaError, NewCode, UploadSession};
use envia_storage::queries::{codes, sessions};
use envia_storage::Database;

/// Owns the temp directory; the database file disappears on drop.
pub struct TestDb {
    pub db: Database,
    _dir: tempfile::TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self, EnviaError> {
        let dir = tempfile::TempDir::new().map_err(|e| EnviaError::Storage { source: e.into() })?;
        let path = dir.path().join("test.db");
        let db = Database::open(&path.to_string_lossy()).await?;
        Ok(Self { db, _dir: dir })
    }

    /// Create a session for `user_id` holding `combined` codes, in order.
    /// Column A is set to `"desc {code}"`.
    pub async fn seed_session(
        &self,
        user_id: &str,
        combined: &[&str],
    ) -> Result<(UploadSession, Vec<Code>), EnviaError> {
        let count = combined.len() as i64;
        let session =
            sessions::create_session(&self.db, user_id, "codes.xlsx", count, count).await?;
        let new_codes: Vec<NewCode> = combined
            .iter()
            .enumerate()
            .map(|(i, code)| NewCode {
                column_a_value: Some(format!("desc {code}")),
                column_d_value: Some((*code).to_string()),
                combined_code: (*code).to_string(),
                row_number: i as i64 + 2,
            })
            .collect();
        let inserted = codes::insert_codes(&self.db, &session.id, &new_codes).await?;
        Ok((session, inserted))
    }
}
