//! Configuration for the consensus round scheduler

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Well-known address of the consensus system contract.
pub const DEFAULT_CONSENSUS_CONTRACT: Address = [
    0xc0, 0x75, 0xe5, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01,
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Contract whose state holds rounds and miners
    pub consensus_contract: Address,
    /// Slot length used when a round has fewer than two miners (ms)
    pub mining_interval_ms: u64,
    /// This node's miner account, if it mines
    pub local_miner: Option<Address>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            consensus_contract: DEFAULT_CONSENSUS_CONTRACT,
            mining_interval_ms: 4_000,
            local_miner: None,
        }
    }
}
