//! Domain layer for consensus rounds

pub mod consensus_state;
mod error;
mod round;

pub use error::{ConsensusError, ConsensusResult};
pub use round::{MinerInRound, Miners, Round};
