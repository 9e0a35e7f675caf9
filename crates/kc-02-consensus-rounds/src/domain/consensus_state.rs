//! Layout of the consensus contract's state.
//!
//! | Path                  | Value              |
//! |-----------------------|--------------------|
//! | `CurrentRoundNumber`  | `u64`              |
//! | `Rounds/{n}`          | `Round`            |
//! | `Miners`              | `Miners`           |
//!
//! Values are bincode encoded. The consensus contract writes these keys;
//! the scheduler only reads them.

use super::{ConsensusError, ConsensusResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Address, StateKey};

pub const CURRENT_ROUND_NUMBER: &str = "CurrentRoundNumber";
pub const ROUNDS_PREFIX: &str = "Rounds";
pub const MINERS: &str = "Miners";

pub fn round_number_key(contract: Address) -> StateKey {
    StateKey::new(contract, CURRENT_ROUND_NUMBER)
}

pub fn round_key(contract: Address, round_number: u64) -> StateKey {
    StateKey::new(contract, format!("{ROUNDS_PREFIX}/{round_number}"))
}

pub fn miners_key(contract: Address) -> StateKey {
    StateKey::new(contract, MINERS)
}

pub fn encode<T: Serialize>(key: &StateKey, value: &T) -> ConsensusResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ConsensusError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(key: &StateKey, bytes: &[u8]) -> ConsensusResult<T> {
    bincode::deserialize(bytes).map_err(|e| ConsensusError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
