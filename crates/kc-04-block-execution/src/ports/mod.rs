//! Ports of the pipeline

mod inbound;
mod validation;

pub use inbound::BlockExecutionApi;
pub use validation::BlockValidationProvider;
