//! Conflict Detector
//!
//! Counts conflicting transaction pairs for the sequential fallback decision.

use crate::domain::entities::AnnotatedTransaction;
use crate::domain::value_objects::{Conflict, DependencyKind};

/// Detect all conflicts between a set of transactions, ordered by pair.
pub fn detect_conflicts(transactions: &[AnnotatedTransaction]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for (i, earlier) in transactions.iter().enumerate() {
        for later in &transactions[i + 1..] {
            if earlier.sender == later.sender {
                conflicts.push(Conflict {
                    earlier: earlier.index,
                    later: later.index,
                    kind: DependencyKind::SameSender,
                    key: None,
                });
                continue;
            }

            if let Some((kind, key)) = earlier.access_pattern.conflicts_with(&later.access_pattern) {
                conflicts.push(Conflict {
                    earlier: earlier.index,
                    later: later.index,
                    kind,
                    key: Some(key),
                });
            }
        }
    }

    conflicts
}

/// Conflicting pairs as a percentage of all pairs
pub fn conflict_percentage(conflicts: &[Conflict], tx_count: usize) -> u8 {
    if tx_count <= 1 {
        return 0;
    }

    let max_pairs = tx_count * (tx_count - 1) / 2;
    let percent = (conflicts.len() * 100) / max_pairs;
    percent.min(100) as u8
}
