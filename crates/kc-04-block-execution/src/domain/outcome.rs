//! Block processing stages and outcomes

use super::error::{PipelineError, StageError};
use shared_types::BlockExecutedSet;
use std::fmt;

/// Where a block is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockProcessingStage {
    Received,
    ValidatingPre,
    Executing,
    ValidatingPost,
    Committed,
}

impl fmt::Display for BlockProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::ValidatingPre => "validating-pre",
            Self::Executing => "executing",
            Self::ValidatingPost => "validating-post",
            Self::Committed => "committed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectKind {
    /// Bad linkage or malformed header
    Structural,
    /// Slot ineligibility, stale or future timestamp, reuse mismatch
    Validation,
    /// Recomputed hash or state root differs from the declared one
    ExecutionMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectReason {
    pub stage: BlockProcessingStage,
    pub kind: RejectKind,
    pub message: String,
    /// The block may become valid later (e.g. it is ahead of local time)
    pub retry_later: bool,
}

impl RejectReason {
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            stage: BlockProcessingStage::ValidatingPre,
            kind: RejectKind::Structural,
            message: message.into(),
            retry_later: false,
        }
    }

    pub fn validation(stage: BlockProcessingStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: RejectKind::Validation,
            message: message.into(),
            retry_later: false,
        }
    }

    pub fn retry_later(message: impl Into<String>) -> Self {
        Self {
            stage: BlockProcessingStage::ValidatingPre,
            kind: RejectKind::Validation,
            message: message.into(),
            retry_later: true,
        }
    }

    pub fn mismatch(stage: BlockProcessingStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: RejectKind::ExecutionMismatch,
            message: message.into(),
            retry_later: false,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.stage, self.message)?;
        if self.retry_later {
            f.write_str(" (retry later)")?;
        }
        Ok(())
    }
}

/// Result of pushing one block through the pipeline.
#[derive(Debug)]
pub enum BlockProcessOutcome {
    Committed(BlockExecutedSet),
    Rejected(RejectReason),
    Aborted(PipelineError),
}

impl BlockProcessOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn executed_set(&self) -> Option<&BlockExecutedSet> {
        match self {
            Self::Committed(set) => Some(set),
            _ => None,
        }
    }
}

impl From<StageError> for BlockProcessOutcome {
    fn from(e: StageError) -> Self {
        match e {
            StageError::Rejected(reason) => Self::Rejected(reason),
            StageError::Aborted(error) => Self::Aborted(error),
        }
    }
}
