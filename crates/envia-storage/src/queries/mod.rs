// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Every function takes `&Database` and runs on the
//! connection's background thread.

pub mod codes;
pub mod credentials;
pub mod history;
pub mod lifecycle;
pub mod sessions;

use std::str::FromStr;

use rusqlite::types::Type;

/// Parse a TEXT column into a strum enum, reporting bad values as a
/// conversion failure on that column.
pub(crate) fn parse_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Largest `IN` list bound in one statement; longer id lists are chunked.
pub(crate) const IN_CHUNK: usize = 500;

/// `?, ?, ?` for an IN clause of `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
