//! Domain types of the pipeline

mod error;
mod outcome;

pub use error::{PipelineError, PipelineResult, StageError};
pub use outcome::{BlockProcessOutcome, BlockProcessingStage, RejectKind, RejectReason};
