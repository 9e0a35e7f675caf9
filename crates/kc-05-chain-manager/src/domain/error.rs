//! Error types for the chain manager

use kc_04_block_execution::PipelineError;
use shared_types::{ChainBlockLinkExecutionStatus, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Chain not created")]
    ChainNotCreated,

    #[error("Chain already created")]
    ChainAlreadyCreated,

    #[error("Unknown parent {parent} for block {block}")]
    UnknownParent { block: String, parent: String },

    #[error("Block {0} already linked to a different parent")]
    DuplicateBlock(String),

    #[error("Invalid height for block {block}: expected {expected}, got {actual}")]
    InvalidHeight {
        block: String,
        expected: u64,
        actual: u64,
    },

    #[error("Parent of block {0} failed execution")]
    ParentExecutionFailed(String),

    #[error("Unknown block link: {0}")]
    UnknownLink(String),

    #[error("Invalid best chain advance: {0}")]
    InvalidAdvance(String),

    #[error("Invalid status transition for {block}: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        block: String,
        from: ChainBlockLinkExecutionStatus,
        to: ChainBlockLinkExecutionStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Infrastructure failure while executing an attachment batch. The
    /// longest branch has already been rolled back.
    #[error("Attachment aborted at block {block}: {source}")]
    Aborted {
        block: String,
        #[source]
        source: PipelineError,
    },
}

impl ChainError {
    /// Rejected before any state access; the caller may retry with a
    /// corrected block.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnknownParent { .. }
                | Self::DuplicateBlock(_)
                | Self::InvalidHeight { .. }
                | Self::ParentExecutionFailed(_)
        )
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
