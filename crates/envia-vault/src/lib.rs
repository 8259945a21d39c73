// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential vault for the Envia delivery core.
//!
//! Per-user provider credentials are serialized to JSON, sealed with
//! AES-256-CBC plus an HMAC-SHA256 tag, and stored as `iv:ciphertext` text
//! in the `api_settings` table. Keys come from a single process-wide secret
//! via Argon2id.

pub mod crypto;
pub mod kdf;
pub mod store;
pub mod token;
pub mod vault;

pub use store::{CredentialStore, CredentialSummary};
pub use vault::{mask_secret, ConfigVault};
