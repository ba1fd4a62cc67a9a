//! Custom assertions for sweep tests

use glacier_sweep::glacier::{Call, InMemoryGlacier};
use glacier_sweep::{SweepReport, SweepState};

/// Assert that every step in the report's path is a legal transition
pub fn assert_legal_path(report: &SweepReport) {
    for pair in report.path.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "illegal transition {} -> {} in {:?}",
            pair[0],
            pair[1],
            report.path
        );
    }
}

/// Assert the sweep stopped in `expected` via a legal path
pub fn assert_stopped_in(report: &SweepReport, expected: SweepState) {
    assert_legal_path(report);
    assert_eq!(
        report.final_state(),
        Some(expected),
        "unexpected final state, path was {:?}",
        report.path
    );
}

/// Archive ids passed to DeleteArchive, in call order
pub fn deleted_archive_ids(glacier: &InMemoryGlacier) -> Vec<String> {
    glacier
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::DeleteArchive { archive_id, .. } => Some(archive_id),
            _ => None,
        })
        .collect()
}

/// Number of calls that would change remote state
pub fn mutating_call_count(glacier: &InMemoryGlacier) -> usize {
    glacier
        .calls()
        .iter()
        .filter(|call| {
            matches!(
                call,
                Call::InitiateJob { .. } | Call::DeleteArchive { .. } | Call::DeleteVault { .. }
            )
        })
        .count()
}
