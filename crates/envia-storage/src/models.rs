// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-specific row and report types. Domain records (`Code`,
//! `UploadSession`, `HistoryItem`) live in `envia-core`.

use envia_core::{Code, CodeStatus, HistoryItem, ServiceType};
use serde::{Deserialize, Serialize};

/// A raw `api_settings` row. `encrypted_config` is an opaque vault token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub user_id: String,
    pub service_type: ServiceType,
    pub encrypted_config: String,
    pub is_active: bool,
    pub last_tested: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Code counts per status within one upload session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusCounts {
    pub available: i64,
    pub sent: i64,
    pub archived: i64,
    pub total: i64,
}

/// One page of a paged listing. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let limit = i64::from(limit.max(1));
        Self {
            items,
            total,
            page,
            total_pages: ((total + limit - 1) / limit) as u32,
        }
    }
}

/// Offset for a 1-based page.
pub(crate) fn page_offset(page: u32, limit: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(limit)
}

/// An archived code with the name of the spreadsheet it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedCode {
    #[serde(flatten)]
    pub code: Code,
    pub filename: String,
    pub session_created_at: String,
}

/// An archive history entry joined with the code it refers to, if it still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveHistoryEntry {
    #[serde(flatten)]
    pub item: HistoryItem,
    pub combined_code: Option<String>,
    pub description: Option<String>,
    pub filename: Option<String>,
}

/// Archive volume for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub total_archived: i64,
    pub archived_today: i64,
    pub archived_this_week: i64,
    pub archived_this_month: i64,
}

/// Successful actions per kind plus the latest activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub total_actions: i64,
    pub whatsapp_sent: i64,
    pub email_sent: i64,
    pub archived_codes: i64,
    pub recent_activity: Vec<HistoryItem>,
}

/// A delivered code that could not be moved to `sent` because it changed
/// while the batch was in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendConflict {
    pub code_id: String,
    pub combined_code: Option<String>,
    /// Status found after delivery; `None` when the code no longer exists.
    pub current: Option<CodeStatus>,
}

impl SendConflict {
    pub fn describe(&self) -> String {
        let label = self.combined_code.as_deref().unwrap_or(&self.code_id);
        match self.current {
            Some(status) => format!("code {label} was delivered but is now {status}; status left unchanged"),
            None => format!("code {label} was delivered but no longer exists"),
        }
    }
}

/// Outcome of recording a delivered batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentBatch {
    pub sent: Vec<Code>,
    pub conflicts: Vec<SendConflict>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<()> = Page::new(vec![], 101, 1, 50);
        assert_eq!(page.total_pages, 3);
        let empty: Page<()> = Page::new(vec![], 0, 1, 50);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
    }

    #[test]
    fn conflict_description_names_code_and_status() {
        let archived = SendConflict {
            code_id: "id-1".into(),
            combined_code: Some("A1".into()),
            current: Some(CodeStatus::Archived),
        };
        assert!(archived.describe().contains("code A1"));
        assert!(archived.describe().contains("archived"));

        let gone = SendConflict {
            code_id: "id-2".into(),
            combined_code: None,
            current: None,
        };
        assert_eq!(gone.describe(), "code id-2 was delivered but no longer exists");
    }
}
