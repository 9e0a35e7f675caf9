//! Value objects for parallel execution

use serde::{Deserialize, Serialize};
use shared_types::StateKey;
use std::collections::BTreeSet;

/// Dependency type between an earlier and a later transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Later reads what earlier writes
    ReadAfterWrite,
    /// Both write the same key
    WriteAfterWrite,
    /// Later writes what earlier reads
    WriteAfterRead,
    /// Same sender, declared order kept
    SameSender,
}

/// Keys a transaction reads and writes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPattern {
    pub reads: BTreeSet<StateKey>,
    pub writes: BTreeSet<StateKey>,
}

impl AccessPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads(mut self, reads: Vec<StateKey>) -> Self {
        self.reads = reads.into_iter().collect();
        self
    }

    pub fn with_writes(mut self, writes: Vec<StateKey>) -> Self {
        self.writes = writes.into_iter().collect();
        self
    }

    /// Conflict between `self` (earlier) and `later`, with the key involved.
    pub fn conflicts_with(&self, later: &AccessPattern) -> Option<(DependencyKind, StateKey)> {
        if let Some(key) = self.writes.intersection(&later.writes).next() {
            return Some((DependencyKind::WriteAfterWrite, key.clone()));
        }
        if let Some(key) = self.writes.intersection(&later.reads).next() {
            return Some((DependencyKind::ReadAfterWrite, key.clone()));
        }
        if let Some(key) = self.reads.intersection(&later.writes).next() {
            return Some((DependencyKind::WriteAfterRead, key.clone()));
        }
        None
    }

    /// Whether the observed accesses stay inside this declaration.
    ///
    /// Reading a key the transaction itself declares as written is allowed.
    pub fn covers(&self, reads: &BTreeSet<StateKey>, writes: &BTreeSet<StateKey>) -> bool {
        writes.is_subset(&self.writes)
            && reads
                .iter()
                .all(|k| self.reads.contains(k) || self.writes.contains(k))
    }
}

/// Conflict between two transactions, by block index
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub earlier: usize,
    pub later: usize,
    pub kind: DependencyKind,
    pub key: Option<StateKey>,
}

/// How a batch was actually run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Parallel,
    Sequential,
}
