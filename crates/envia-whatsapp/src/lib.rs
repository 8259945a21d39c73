// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business delivery adapter.
//!
//! A batch of codes becomes one text message, sent with a single POST to
//! the Graph API `/{phone_number_id}/messages` endpoint under the shared
//! breaker, retry, and timeout policy.

pub mod adapter;
pub mod client;
pub mod diagnostics;
pub mod message;
pub mod phone;
pub mod types;

pub use adapter::WhatsAppAdapter;
pub use client::GraphClient;
pub use phone::{normalize_phone, prepare_destination};
pub use types::PhoneNumberInfo;
