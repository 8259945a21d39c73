// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the delivery core and its collaborators.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod credentials;
pub mod delivery;

pub use credentials::CredentialProvider;
pub use delivery::DeliveryAdapter;
