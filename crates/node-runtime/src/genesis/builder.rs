//! # Genesis Transaction Builder

use crate::config::NodeConfig;
use crate::contracts::consensus;
use kc_02_consensus_rounds::{Miners, Round};
use shared_types::{Address, Transaction};
use thiserror::Error;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Genesis needs at least one miner")]
    NoMiners,

    #[error("Invalid genesis round: {0}")]
    InvalidRound(String),
}

/// Assembles the transactions of the genesis block.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    consensus_contract: Address,
    miners: Vec<Address>,
    first_round_start_ms: u64,
    mining_interval_ms: u64,
    seed_transactions: Vec<Transaction>,
}

impl GenesisBuilder {
    /// The first round starts one mining interval after the genesis
    /// timestamp.
    pub fn from_config(config: &NodeConfig) -> Self {
        let interval = config.consensus.mining_interval_ms;
        Self {
            consensus_contract: config.consensus.consensus_contract,
            miners: config.initial_miners(),
            first_round_start_ms: config.chain.genesis_timestamp + interval,
            mining_interval_ms: interval,
            seed_transactions: Vec::new(),
        }
    }

    pub fn with_first_round_start(mut self, start_ms: u64) -> Self {
        self.first_round_start_ms = start_ms;
        self
    }

    /// Append a transaction executed after the consensus initialisation.
    pub fn with_seed_transaction(mut self, transaction: Transaction) -> Self {
        self.seed_transactions.push(transaction);
        self
    }

    /// Round 1, miners in configured order.
    pub fn first_round(&self) -> Result<Round, GenesisError> {
        if self.miners.is_empty() {
            return Err(GenesisError::NoMiners);
        }
        let miners = Miners::new(1, self.miners.clone());
        let round = Round::first(&miners, self.first_round_start_ms, self.mining_interval_ms);
        round
            .validate_orders()
            .map_err(|e| GenesisError::InvalidRound(e.to_string()))?;
        Ok(round)
    }

    /// `InitialRound` sent by the first miner, then the seed transactions.
    pub fn build(&self) -> Result<Vec<Transaction>, GenesisError> {
        let round = self.first_round()?;
        let sender = *self.miners.first().ok_or(GenesisError::NoMiners)?;
        let mut transactions = vec![consensus::initial_round(
            self.consensus_contract,
            sender,
            &round,
        )];
        transactions.extend(self.seed_transactions.iter().cloned());
        Ok(transactions)
    }
}
