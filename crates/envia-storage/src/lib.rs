// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Envia delivery core.
//!
//! WAL-mode SQLite with embedded migrations and a single writer thread
//! (`tokio-rusqlite`). Query modules cover upload sessions, codes, the
//! append-only history log, encrypted credential rows, and the code
//! lifecycle transitions.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::{map_tr_err, Database};
pub use models::*;
pub use queries::lifecycle::ArchiveMode;
