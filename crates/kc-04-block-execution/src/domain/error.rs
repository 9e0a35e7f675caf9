//! Error types for the block execution pipeline

use super::outcome::RejectReason;
use kc_01_state_storage::StateStoreError;
use kc_03_parallel_execution::ExecutionError;
use shared_types::StorageError;

/// Infrastructure failures. Any of these aborts the block.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("State error: {0}")]
    State(#[from] StateStoreError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Why a stage did not complete.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Rejected: {0}")]
    Rejected(RejectReason),

    #[error("Aborted: {0}")]
    Aborted(#[from] PipelineError),
}

impl From<RejectReason> for StageError {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

impl From<StorageError> for StageError {
    fn from(e: StorageError) -> Self {
        Self::Aborted(e.into())
    }
}

impl From<StateStoreError> for StageError {
    fn from(e: StateStoreError) -> Self {
        Self::Aborted(e.into())
    }
}

impl From<ExecutionError> for StageError {
    fn from(e: ExecutionError) -> Self {
        Self::Aborted(e.into())
    }
}
