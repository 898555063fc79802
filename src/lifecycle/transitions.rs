// ABOUTME: Declarative booking status transition table and pure guard check
// ABOUTME: Total mapping from each status to its directly reachable statuses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! # Transition Table
//!
//! Static configuration data, not behavior. The `match` is total over all
//! eight statuses, so adding a status without defining its outgoing edges is
//! a compile error. `COMPLETED` and `CANCELLED` have empty edge sets and are
//! therefore terminal.

use crate::models::BookingStatus;

/// Statuses directly reachable from `from` by a normal (non-override)
/// transition
#[must_use]
pub const fn allowed_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    match from {
        BookingStatus::Pending => &[BookingStatus::Assigned, BookingStatus::Cancelled],
        BookingStatus::Assigned => &[
            BookingStatus::InProgress,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ],
        BookingStatus::InProgress => &[
            BookingStatus::Completed,
            BookingStatus::ProviderNoShow,
            BookingStatus::Cancelled,
        ],
        BookingStatus::Rejected | BookingStatus::ProviderNoShow => &[BookingStatus::ReAssigned],
        BookingStatus::ReAssigned => &[BookingStatus::Assigned],
        BookingStatus::Completed | BookingStatus::Cancelled => &[],
    }
}

/// Pure membership check against the transition table
///
/// No side effects and no role policy; admin override is layered on top by
/// the engine and recorded as `ADMIN_OVERRIDE`, never here.
#[must_use]
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus as S;

    #[test]
    fn test_table_edges_are_exact() {
        // Every (from, to) pair checked against the full edge set.
        let edges = [
            (S::Pending, S::Assigned),
            (S::Pending, S::Cancelled),
            (S::Assigned, S::InProgress),
            (S::Assigned, S::Rejected),
            (S::Assigned, S::Cancelled),
            (S::InProgress, S::Completed),
            (S::InProgress, S::ProviderNoShow),
            (S::InProgress, S::Cancelled),
            (S::Rejected, S::ReAssigned),
            (S::ProviderNoShow, S::ReAssigned),
            (S::ReAssigned, S::Assigned),
        ];

        for from in S::all() {
            for to in S::all() {
                let expected = edges.contains(&(from, to));
                assert_eq!(
                    can_transition(from, to),
                    expected,
                    "edge {from} -> {to} mismatch"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_outgoing_edges() {
        assert!(allowed_transitions(S::Completed).is_empty());
        assert!(allowed_transitions(S::Cancelled).is_empty());
    }

    #[test]
    fn test_total_edge_count() {
        let total: usize = S::all()
            .iter()
            .map(|s| allowed_transitions(*s).len())
            .sum();
        assert_eq!(total, 11);
    }
}
