// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Envia integration tests.
//!
//! # Components
//!
//! - [`StaticCredentials`] - in-memory credential provider
//! - [`RecordingMailer`] - mail transport that captures instead of sending
//! - [`TestDb`] - temp SQLite database with a seeded upload session

pub mod credentials;
pub mod harness;
pub mod mailer;

pub use credentials::StaticCredentials;
pub use harness::TestDb;
pub use mailer::RecordingMailer;
