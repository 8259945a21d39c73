// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration on top of the adapters and the store.
//!
//! [`Dispatcher`] validates a send against the code lifecycle, hands the
//! batch to the matching [`DeliveryAdapter`](envia_core::DeliveryAdapter),
//! and commits the `available -> sent` transition only after the provider
//! accepted the message.

pub mod connectivity;
pub mod dispatcher;

pub use connectivity::{ConnectivityReport, ConnectivitySummary, OverallStatus, ServiceStatus};
pub use dispatcher::Dispatcher;
