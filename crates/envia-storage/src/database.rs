// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, migrations, shutdown.
//!
//! All writes go through `tokio-rusqlite`'s single background thread. Query
//! modules take `&Database` and never open their own connection.

use std::path::Path;

use envia_config::StorageConfig;
use envia_core::EnviaError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Handle to the single SQLite connection. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, EnviaError> {
        Self::open_with(path, true).await
    }

    /// Open using the `[storage]` configuration section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, EnviaError> {
        Self::open_with(&config.database_path, config.wal_mode).await
    }

    async fn open_with(path: &str, wal_mode: bool) -> Result<Self, EnviaError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| EnviaError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(sql_err)?;

        conn.call(move |conn| -> Result<Result<(), EnviaError>, rusqlite::Error> {
            if wal_mode {
                let _mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        info!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), EnviaError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Convert tokio-rusqlite errors into [`EnviaError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> EnviaError {
    EnviaError::Storage {
        source: Box::new(e),
    }
}

/// Convert a bare rusqlite error into [`EnviaError::Storage`].
pub(crate) fn sql_err(e: rusqlite::Error) -> EnviaError {
    EnviaError::Storage {
        source: Box::new(e),
    }
}
