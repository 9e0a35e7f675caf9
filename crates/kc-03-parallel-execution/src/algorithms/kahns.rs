//! Kahn's Topological Sort Algorithm
//!
//! Peels the graph level by level: every wave holds the transactions whose
//! predecessors all ran in earlier waves. O(V + E).

use crate::domain::entities::{DependencyGraph, ExecutionSchedule};
use crate::domain::errors::ExecutionError;

/// Layer `graph` into waves, each sorted by block index.
///
/// Fails with `CycleDetected` if some transactions can never become ready.
pub fn kahns_topological_sort(graph: &DependencyGraph) -> Result<ExecutionSchedule, ExecutionError> {
    let mut waiting_on = graph.predecessors.clone();
    let mut ready = graph.roots();
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut placed = 0;

    while !ready.is_empty() {
        let mut unlocked = Vec::new();
        for &index in &ready {
            for &next in graph.successors.get(index).into_iter().flatten() {
                if let Some(count) = waiting_on.get_mut(next) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        unlocked.push(next);
                    }
                }
            }
        }
        placed += ready.len();
        unlocked.sort_unstable();
        levels.push(std::mem::replace(&mut ready, unlocked));
    }

    if placed < graph.len() {
        return Err(ExecutionError::CycleDetected);
    }
    Ok(ExecutionSchedule::from_levels(levels))
}
