//! Checks a schedule must pass before it is executed concurrently.
//!
//! The coordinator asserts them in debug builds; the tests use them to
//! judge the scheduler.

use super::entities::{DependencyGraph, ExecutionSchedule, Wave};

/// Each transaction runs in a later wave than everything it depends on.
pub fn invariant_topological_order(schedule: &ExecutionSchedule, graph: &DependencyGraph) -> bool {
    let mut level_of = vec![None; graph.len()];
    for wave in &schedule.waves {
        for &index in &wave.indices {
            if let Some(slot) = level_of.get_mut(index) {
                *slot = Some(wave.level);
            }
        }
    }
    graph.edges.iter().all(|edge| {
        matches!(
            (level_of.get(edge.before), level_of.get(edge.after)),
            (Some(Some(before)), Some(Some(after))) if before < after
        )
    })
}

/// Edges only point forward in block order, which rules out cycles.
pub fn invariant_no_cycles(graph: &DependencyGraph) -> bool {
    graph.edges.iter().all(|edge| edge.before < edge.after)
}

/// No two members of a wave are ordered against each other.
pub fn invariant_parallel_safety(wave: &Wave, graph: &DependencyGraph) -> bool {
    wave.indices.iter().enumerate().all(|(i, &a)| {
        wave.indices[i + 1..]
            .iter()
            .all(|&b| !graph.orders(a, b) && !graph.orders(b, a))
    })
}

/// Every block index appears exactly once.
pub fn invariant_completeness(schedule: &ExecutionSchedule, graph: &DependencyGraph) -> bool {
    let mut seen = vec![false; graph.len()];
    for index in schedule.execution_order() {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    seen.into_iter().all(|s| s)
}
