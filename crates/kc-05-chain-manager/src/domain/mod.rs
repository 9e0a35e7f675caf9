//! Domain layer of the chain manager

mod cycle;
mod error;
mod link_index;

pub use cycle::{AttachCycle, AttachOutcome};
pub use error::{ChainError, ChainResult};
pub use link_index::LinkIndex;
