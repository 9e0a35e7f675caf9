//! Built-in validation providers

mod consensus;
mod execution_result;
mod header;

pub use consensus::ConsensusValidationProvider;
pub use execution_result::ExecutionResultValidationProvider;
pub use header::BlockHeaderValidationProvider;
