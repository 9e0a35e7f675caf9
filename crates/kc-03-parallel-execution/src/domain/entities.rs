//! Core entities for parallel execution

use super::value_objects::{AccessPattern, DependencyKind, ExecutionMode};
use kc_01_state_storage::StateDelta;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Block, Hash, LogEvent, StateKey, TransactionResult};

/// Transaction with its position in the block and access pattern
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedTransaction {
    /// Position in the block's declared order
    pub index: usize,
    pub id: Hash,
    /// Sender address (for same-sender ordering)
    pub sender: Address,
    pub access_pattern: AccessPattern,
}

impl AnnotatedTransaction {
    pub fn new(index: usize, id: Hash, sender: Address, access_pattern: AccessPattern) -> Self {
        Self {
            index,
            id,
            sender,
            access_pattern,
        }
    }
}

/// Ordering constraint: `before` must finish before `after` starts.
/// `before` is always the lower block index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub before: usize,
    pub after: usize,
    pub kind: DependencyKind,
    /// State key both transactions touch, `None` for sender chains
    pub key: Option<StateKey>,
}

impl Edge {
    pub fn new(before: usize, after: usize, kind: DependencyKind) -> Self {
        Self {
            before,
            after,
            kind,
            key: None,
        }
    }

    pub fn on_key(mut self, key: StateKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// Ordering constraints of one batch. Node `i` is the transaction at block
/// index `i`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    pub nodes: Vec<AnnotatedTransaction>,
    pub edges: Vec<Edge>,
    /// `successors[i]`: indices that wait on `i`
    pub successors: Vec<Vec<usize>>,
    /// `predecessors[i]`: number of edges into `i`
    pub predecessors: Vec<usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next transaction; indices must arrive in block order.
    pub fn push(&mut self, tx: AnnotatedTransaction) {
        debug_assert_eq!(tx.index, self.nodes.len());
        self.nodes.push(tx);
        self.successors.push(Vec::new());
        self.predecessors.push(0);
    }

    pub fn link(&mut self, edge: Edge) {
        match (
            self.successors.get_mut(edge.before),
            self.predecessors.get_mut(edge.after),
        ) {
            (Some(successors), Some(count)) => {
                successors.push(edge.after);
                *count += 1;
                self.edges.push(edge);
            }
            _ => debug_assert!(false, "edge {}->{} outside the graph", edge.before, edge.after),
        }
    }

    pub fn orders(&self, before: usize, after: usize) -> bool {
        self.successors
            .get(before)
            .is_some_and(|successors| successors.contains(&after))
    }

    /// Indices nothing waits on, ascending.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.predecessors.len())
            .filter(|&i| self.predecessors[i] == 0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Transactions with no ordering constraint between them; they run
/// concurrently against the state left by the previous waves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Position in the schedule, starting at 0
    pub level: usize,
    /// Block indices, ascending
    pub indices: Vec<usize>,
}

/// Waves in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSchedule {
    pub waves: Vec<Wave>,
}

impl ExecutionSchedule {
    /// Builds the schedule from index lists, one per wave.
    pub fn from_levels(levels: Vec<Vec<usize>>) -> Self {
        let waves = levels
            .into_iter()
            .enumerate()
            .map(|(level, indices)| Wave { level, indices })
            .collect();
        Self { waves }
    }

    /// Block order, one transaction per wave.
    pub fn in_block_order(count: usize) -> Self {
        Self::from_levels((0..count).map(|i| vec![i]).collect())
    }

    pub fn transaction_count(&self) -> usize {
        self.waves.iter().map(|w| w.indices.len()).sum()
    }

    /// Size of the largest wave.
    pub fn width(&self) -> usize {
        self.waves.iter().map(|w| w.indices.len()).max().unwrap_or(0)
    }

    pub fn execution_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.waves.iter().flat_map(|w| w.indices.iter().copied())
    }
}

/// Block-level facts a contract may read while executing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub block_height: u64,
    pub block_timestamp: u64,
    pub producer: Address,
    pub previous_block_hash: Hash,
}

/// Contract-level failure of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFault(pub String);

impl ContractFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// What executing one transaction produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionTrace {
    /// `Some` when the contract reverted; writes are then discarded
    pub fault: Option<ContractFault>,
    pub return_value: Vec<u8>,
    pub logs: Vec<LogEvent>,
    pub writes: StateDelta,
}

impl TransactionTrace {
    pub fn success(return_value: Vec<u8>, writes: StateDelta) -> Self {
        Self {
            fault: None,
            return_value,
            logs: Vec::new(),
            writes,
        }
    }

    pub fn failed(fault: ContractFault) -> Self {
        Self {
            fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn with_logs(mut self, logs: Vec<LogEvent>) -> Self {
        self.logs = logs;
        self
    }

    pub fn is_success(&self) -> bool {
        self.fault.is_none()
    }
}

/// Output of one batch
#[derive(Debug, Clone)]
pub struct BatchExecutionOutput {
    /// Input block re-stamped with the execution commitments
    pub block: Block,
    /// Results in block order, keyed to `block`'s hash
    pub transaction_results: Vec<TransactionResult>,
    pub merged_delta: StateDelta,
    pub schedule: ExecutionSchedule,
    pub mode: ExecutionMode,
}
