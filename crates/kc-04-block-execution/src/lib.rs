//! # kc-04-block-execution
//!
//! Block execution pipeline: validates, executes and commits one block.
//!
//! ## Stages
//!
//! ```text
//! Received -> ValidatingPre -> Executing -> ValidatingPost -> Committed
//!                  |               |              |
//!                  +---------------+--------------+--> Rejected
//! ```
//!
//! Every stage returns a tagged outcome instead of raising:
//!
//! - `Committed(BlockExecutedSet)`: results persisted, state version sealed
//! - `Rejected(RejectReason)`: the block is invalid, possibly only for now
//!   (`retry_later`); nothing was written
//! - `Aborted(PipelineError)`: a store failed; the caller rolls back
//!
//! ## Re-execution
//!
//! A block whose state version already exists is not executed again. Its
//! executed set is rebuilt from persisted results, and the block read back
//! from storage must hash to exactly the requested hash.
//!
//! The pipeline never retries on its own and never touches link status;
//! both belong to the chain manager.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod validation;

pub use config::PipelineConfig;
pub use domain::{
    BlockProcessOutcome, BlockProcessingStage, PipelineError, PipelineResult, RejectKind,
    RejectReason, StageError,
};
pub use ports::{BlockExecutionApi, BlockValidationProvider};
pub use service::BlockExecutionPipeline;
pub use validation::{
    BlockHeaderValidationProvider, ConsensusValidationProvider, ExecutionResultValidationProvider,
};
