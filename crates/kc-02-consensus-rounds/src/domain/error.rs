//! Error types for the consensus round scheduler

use kc_01_state_storage::StateStoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Unknown miner: {0}")]
    UnknownMiner(String),

    #[error("Round not initialized")]
    RoundNotInitialized,

    #[error("Round {round_number} orders are not a permutation of 0..N-1")]
    InvalidOrders { round_number: u64 },

    #[error("Failed to encode consensus state {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Failed to decode consensus state {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("State error: {0}")]
    State(#[from] StateStoreError),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
