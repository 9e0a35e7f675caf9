//! Dependency Graph Builder

use crate::domain::entities::{AnnotatedTransaction, DependencyGraph, Edge};
use crate::domain::value_objects::DependencyKind;
use shared_types::Address;
use std::collections::HashMap;

/// Build a dependency graph from transactions in block order.
///
/// Edges always go from the earlier to the later index:
/// 1. Same sender: consecutive transactions of one sender are chained
/// 2. Data: write-after-write, read-after-write, write-after-read
pub fn build_dependency_graph(transactions: Vec<AnnotatedTransaction>) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for tx in &transactions {
        graph.push(tx.clone());
    }

    // Same-sender chains, in declared order
    let mut last_by_sender: HashMap<Address, usize> = HashMap::new();
    for tx in &transactions {
        if let Some(previous) = last_by_sender.insert(tx.sender, tx.index) {
            graph.link(Edge::new(previous, tx.index, DependencyKind::SameSender));
        }
    }

    for (i, earlier) in transactions.iter().enumerate() {
        for later in &transactions[i + 1..] {
            // Already ordered through the sender chain
            if earlier.sender == later.sender {
                continue;
            }

            if let Some((kind, key)) = earlier.access_pattern.conflicts_with(&later.access_pattern) {
                graph.link(Edge::new(earlier.index, later.index, kind).on_key(key));
            }
        }
    }

    graph
}
