//! Error types for parallel execution

use kc_01_state_storage::StateStoreError;
use thiserror::Error;

/// Errors that abort a whole batch.
///
/// A contract fault is not an error here; it becomes a `Failed` result.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Batch size exceeded limits
    #[error("Batch size exceeded: {size} > {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Cycle detected in dependency graph
    #[error("Cycle detected in dependency graph")]
    CycleDetected,

    /// State could not be read
    #[error("State unavailable: {0}")]
    StateUnavailable(#[from] StateStoreError),

    /// An execution task panicked or was cancelled
    #[error("Execution task failed: {0}")]
    TaskFailed(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Analysis error for access pattern detection
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No access pattern declared for transaction {0}")]
    Undeclared(String),

    #[error("Failed to decode transaction: {0}")]
    DecodeFailed(String),
}
