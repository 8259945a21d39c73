// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code status state machine.
//!
//! Legal edges:
//!
//! ```text
//! available --send--> sent --archive--> archived
//!     |                                   |
//!     +-------------archive-------------->+
//!     ^                                   |
//!     +--------------restore--------------+
//! ```
//!
//! The storage layer enforces these rules with compare-and-swap updates; this
//! module is the single place the edges are written down.

use crate::error::EnviaError;
use crate::types::CodeStatus;

impl CodeStatus {
    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: CodeStatus) -> bool {
        matches!(
            (self, next),
            (CodeStatus::Available, CodeStatus::Sent)
                | (CodeStatus::Available, CodeStatus::Archived)
                | (CodeStatus::Sent, CodeStatus::Archived)
                | (CodeStatus::Archived, CodeStatus::Available)
        )
    }

    /// Statuses from which `self` can be reached.
    pub fn predecessors(self) -> &'static [CodeStatus] {
        match self {
            CodeStatus::Available => &[CodeStatus::Archived],
            CodeStatus::Sent => &[CodeStatus::Available],
            CodeStatus::Archived => &[CodeStatus::Available, CodeStatus::Sent],
        }
    }
}

/// Validate a transition for a specific code, producing a typed error on failure.
pub fn check_transition(
    code_id: &str,
    from: CodeStatus,
    to: CodeStatus,
) -> Result<(), EnviaError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(EnviaError::InvalidTransition {
            code_id: code_id.to_string(),
            from,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CodeStatus; 3] = [CodeStatus::Available, CodeStatus::Sent, CodeStatus::Archived];

    #[test]
    fn exactly_four_legal_edges() {
        let legal: Vec<_> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(legal.len(), 4);
    }

    #[test]
    fn archived_cannot_go_straight_to_sent() {
        let err = check_transition("c1", CodeStatus::Archived, CodeStatus::Sent).unwrap_err();
        assert!(matches!(
            err,
            EnviaError::InvalidTransition {
                from: CodeStatus::Archived,
                to: CodeStatus::Sent,
                ..
            }
        ));
    }

    #[test]
    fn self_loops_are_rejected() {
        for status in ALL {
            assert!(!status.can_transition_to(status), "{status} -> {status}");
        }
    }

    #[test]
    fn full_cycle_is_legal() {
        let cycle = [
            CodeStatus::Available,
            CodeStatus::Sent,
            CodeStatus::Archived,
            CodeStatus::Available,
        ];
        for pair in cycle.windows(2) {
            check_transition("c1", pair[0], pair[1]).unwrap();
        }
    }

    #[test]
    fn predecessors_agree_with_edges() {
        for to in ALL {
            for from in ALL {
                assert_eq!(
                    to.predecessors().contains(&from),
                    from.can_transition_to(to),
                    "{from} -> {to}"
                );
            }
        }
    }
}
