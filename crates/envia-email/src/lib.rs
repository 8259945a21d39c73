// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery adapter.
//!
//! A batch of codes becomes one multipart (plain text + HTML) message sent
//! through lettre. Connection parameters come from the user's sealed SMTP
//! credentials; the transport is created per call through a
//! [`MailerFactory`] so tests can run without a mail server.

pub mod adapter;
pub mod content;
pub mod diagnostics;
pub mod presets;
pub mod transport;

pub use adapter::{is_valid_email, EmailAdapter};
pub use presets::ProviderPreset;
pub use transport::{
    Mailer, MailerFactory, OutgoingEmail, SmtpMailer, SmtpMailerFactory, SmtpSettings, TlsMode,
};
