//! Round domain entities

use super::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::BTreeMap;

/// A miner's schedule entry inside one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerInRound {
    pub address: Address,
    /// Position in the round, `0..N-1`
    pub order: u32,
    /// Start of this miner's slot (unix ms)
    pub expected_mining_time: u64,
    /// When the miner actually produced, if it did
    pub actual_mining_time: Option<u64>,
    pub missed_time_slots: u64,
    pub produced_blocks: u64,
}

/// The active miner set of a term. Replaced wholesale on term change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miners {
    pub term_number: u64,
    pub addresses: Vec<Address>,
}

impl Miners {
    pub fn new(term_number: u64, addresses: Vec<Address>) -> Self {
        Self {
            term_number,
            addresses,
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// One consensus epoch's miner schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_number: u64,
    pub term_number: u64,
    pub miners: BTreeMap<Address, MinerInRound>,
}

impl Round {
    /// First round of a term: miners take slots in list order starting at
    /// `start_time`.
    pub fn first(miners: &Miners, start_time: u64, interval_ms: u64) -> Self {
        Self::scheduled(1, miners, start_time, interval_ms)
    }

    /// Round `round_number` for `miners`, slot `i` at `start_time + i * interval`.
    pub fn scheduled(round_number: u64, miners: &Miners, start_time: u64, interval_ms: u64) -> Self {
        let miners_map = miners
            .addresses
            .iter()
            .enumerate()
            .map(|(i, address)| {
                let order = i as u32;
                (
                    *address,
                    MinerInRound {
                        address: *address,
                        order,
                        expected_mining_time: start_time + u64::from(order) * interval_ms,
                        ..Default::default()
                    },
                )
            })
            .collect();

        Self {
            round_number,
            term_number: miners.term_number,
            miners: miners_map,
        }
    }

    /// Orders must be a permutation of `0..N-1`.
    pub fn validate_orders(&self) -> ConsensusResult<()> {
        let n = self.miners.len();
        let mut seen = vec![false; n];
        for miner in self.miners.values() {
            let order = miner.order as usize;
            if order >= n || seen[order] {
                return Err(ConsensusError::InvalidOrders {
                    round_number: self.round_number,
                });
            }
            seen[order] = true;
        }
        Ok(())
    }

    /// Miners sorted by order position.
    pub fn ordered_miners(&self) -> Vec<&MinerInRound> {
        let mut miners: Vec<&MinerInRound> = self.miners.values().collect();
        miners.sort_by_key(|m| m.order);
        miners
    }

    /// Slot length, derived from the first two slots when there are two.
    pub fn mining_interval(&self, fallback_ms: u64) -> u64 {
        let ordered = self.ordered_miners();
        match (ordered.first(), ordered.get(1)) {
            (Some(first), Some(second)) => second
                .expected_mining_time
                .saturating_sub(first.expected_mining_time),
            _ => fallback_ms,
        }
    }

    pub fn start_time(&self) -> Option<u64> {
        self.ordered_miners().first().map(|m| m.expected_mining_time)
    }

    /// End of the last slot.
    pub fn end_time(&self, fallback_interval_ms: u64) -> Option<u64> {
        let interval = self.mining_interval(fallback_interval_ms);
        self.ordered_miners()
            .last()
            .map(|m| m.expected_mining_time + interval)
    }

    /// The miner whose slot contains `time`.
    pub fn miner_at(&self, time: u64, fallback_interval_ms: u64) -> Option<&MinerInRound> {
        let interval = self.mining_interval(fallback_interval_ms);
        self.miners.values().find(|m| {
            time >= m.expected_mining_time && time < m.expected_mining_time + interval
        })
    }

    /// Record a produced block for `address`.
    pub fn record_production(&mut self, address: &Address, time: u64) -> ConsensusResult<()> {
        let miner = self
            .miners
            .get_mut(address)
            .ok_or_else(|| ConsensusError::UnknownMiner(hex::encode(address)))?;
        miner.actual_mining_time = Some(time);
        miner.produced_blocks += 1;
        Ok(())
    }

    /// Build the following round: same order, slots start where this round
    /// ends, miners that never produced get a missed slot.
    pub fn next_round(&self, fallback_interval_ms: u64) -> Round {
        let interval = self.mining_interval(fallback_interval_ms);
        let start = self.end_time(fallback_interval_ms).unwrap_or_default();
        let miners = self
            .miners
            .iter()
            .map(|(address, miner)| {
                let missed = u64::from(miner.actual_mining_time.is_none());
                (
                    *address,
                    MinerInRound {
                        address: *address,
                        order: miner.order,
                        expected_mining_time: start + u64::from(miner.order) * interval,
                        actual_mining_time: None,
                        missed_time_slots: miner.missed_time_slots + missed,
                        produced_blocks: miner.produced_blocks,
                    },
                )
            })
            .collect();

        Round {
            round_number: self.round_number + 1,
            term_number: self.term_number,
            miners,
        }
    }
}
