// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Both configuration probes at once, with a summary.

use serde::Serialize;

use envia_core::{ConnectivityTestResult, DeliveryAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Connected,
    Failed,
}

impl From<&ConnectivityTestResult> for ServiceStatus {
    fn from(result: &ConnectivityTestResult) -> Self {
        if result.success {
            Self::Connected
        } else {
            Self::Failed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    AllConnected,
    PartialOrFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivitySummary {
    pub whatsapp_status: ServiceStatus,
    pub email_status: ServiceStatus,
    pub overall_status: OverallStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectivityReport {
    pub whatsapp: ConnectivityTestResult,
    pub email: ConnectivityTestResult,
    pub summary: ConnectivitySummary,
}

/// Run both probes concurrently. Neither probe can fail the other.
pub async fn test_all(
    whatsapp: &dyn DeliveryAdapter,
    email: &dyn DeliveryAdapter,
    user_id: &str,
) -> ConnectivityReport {
    let (whatsapp, email) = tokio::join!(
        whatsapp.test_configuration(user_id),
        email.test_configuration(user_id)
    );
    let whatsapp_status = ServiceStatus::from(&whatsapp);
    let email_status = ServiceStatus::from(&email);
    let overall_status = if whatsapp_status == ServiceStatus::Connected
        && email_status == ServiceStatus::Connected
    {
        OverallStatus::AllConnected
    } else {
        OverallStatus::PartialOrFailed
    };
    ConnectivityReport {
        whatsapp,
        email,
        summary: ConnectivitySummary {
            whatsapp_status,
            email_status,
            overall_status,
        },
    }
}
