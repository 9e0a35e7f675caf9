use serde::{Deserialize, Serialize};
use shared_types::{Hash, EMPTY_HASH};
use std::fmt;

/// Identifier of a state version: the hash of the block whose execution
/// produced it. `StateVersion::EMPTY` is the state before genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateVersion(pub Hash);

impl StateVersion {
    pub const EMPTY: StateVersion = StateVersion(EMPTY_HASH);

    pub fn of_block(block_hash: Hash) -> Self {
        Self(block_hash)
    }

    pub fn block_hash(&self) -> Hash {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == EMPTY_HASH
    }
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..6]))
    }
}
