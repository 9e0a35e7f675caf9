//! Consensus Round Scheduler
//!
//! Read-only projection of the persisted round state: current round,
//! miner schedule entries and time-slot distances.

use crate::config::ConsensusConfig;
use crate::domain::consensus_state::{self, miners_key, round_key, round_number_key};
use crate::domain::{ConsensusError, ConsensusResult, MinerInRound, Miners, Round};
use crate::ports::{CurrentStateVersion, SystemTimeSource, TimeSource};
use kc_01_state_storage::{StateStore, StateVersion};
use serde::de::DeserializeOwned;
use shared_types::{Address, StateKey};
use std::sync::Arc;
use tracing::{debug, error, trace};

pub struct ConsensusRoundScheduler {
    state_store: Arc<dyn StateStore>,
    versions: Arc<dyn CurrentStateVersion>,
    config: ConsensusConfig,
    time_source: Arc<dyn TimeSource>,
}

impl ConsensusRoundScheduler {
    pub fn new(
        state_store: Arc<dyn StateStore>,
        versions: Arc<dyn CurrentStateVersion>,
        config: ConsensusConfig,
    ) -> Self {
        Self {
            state_store,
            versions,
            config,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.time_source.now_ms()
    }

    fn current_version(&self) -> StateVersion {
        self.versions.current_state_version()
    }

    async fn read<T: DeserializeOwned>(
        &self,
        version: &StateVersion,
        key: &StateKey,
    ) -> ConsensusResult<Option<T>> {
        let Some(bytes) = self.state_store.get(version, key).await? else {
            return Ok(None);
        };
        consensus_state::decode(key, &bytes).map(Some)
    }

    // === ROUND NUMBER ===

    /// Latest round number, `0` when none is readable.
    pub async fn current_round_number(&self) -> u64 {
        self.current_round_number_at(&self.current_version()).await
    }

    pub async fn current_round_number_at(&self, version: &StateVersion) -> u64 {
        let key = round_number_key(self.config.consensus_contract);
        match self.read::<u64>(version, &key).await {
            Ok(Some(number)) => number,
            Ok(None) => {
                trace!(version = %version, "No current round number");
                0
            }
            Err(e) => {
                trace!(version = %version, error = %e, "Failed to get current round number");
                0
            }
        }
    }

    // === ROUND ===

    /// Round keyed by the current round number, `None` on any failure.
    pub async fn current_round(&self) -> Option<Round> {
        self.current_round_at(&self.current_version()).await
    }

    pub async fn current_round_at(&self, version: &StateVersion) -> Option<Round> {
        let round_number = self.current_round_number_at(version).await;
        if round_number == 0 {
            debug!(version = %version, "Consensus round not initialized");
            return None;
        }

        let key = round_key(self.config.consensus_contract, round_number);
        let round = match self.read::<Round>(version, &key).await {
            Ok(Some(round)) => round,
            Ok(None) => {
                error!(round_number, "Round information missing for current round number");
                return None;
            }
            Err(e) => {
                error!(round_number, error = %e, "Failed to get round information");
                return None;
            }
        };

        if let Err(e) = round.validate_orders() {
            error!(round_number, error = %e, "Persisted round is malformed");
            return None;
        }
        Some(round)
    }

    // === MINERS ===

    /// Active miner set, empty when unreadable.
    pub async fn current_miners(&self) -> Miners {
        self.current_miners_at(&self.current_version()).await
    }

    pub async fn current_miners_at(&self, version: &StateVersion) -> Miners {
        let key = miners_key(self.config.consensus_contract);
        match self.read::<Miners>(version, &key).await {
            Ok(Some(miners)) => miners,
            Ok(None) => Miners::default(),
            Err(e) => {
                trace!(error = %e, "Failed to get miners list");
                Miners::default()
            }
        }
    }

    /// Schedule entry of `miner` in the current round.
    pub async fn miner_info(&self, miner: &Address) -> ConsensusResult<MinerInRound> {
        self.miner_info_at(&self.current_version(), miner).await
    }

    pub async fn miner_info_at(
        &self,
        version: &StateVersion,
        miner: &Address,
    ) -> ConsensusResult<MinerInRound> {
        let round = self
            .current_round_at(version)
            .await
            .ok_or(ConsensusError::RoundNotInitialized)?;
        round
            .miners
            .get(miner)
            .cloned()
            .ok_or_else(|| ConsensusError::UnknownMiner(hex::encode(miner)))
    }

    /// Schedule entry of this node's own miner account.
    pub async fn local_miner_info(&self) -> ConsensusResult<MinerInRound> {
        let miner = self
            .config
            .local_miner
            .ok_or_else(|| ConsensusError::UnknownMiner("no local miner configured".into()))?;
        self.miner_info(&miner).await
    }

    pub async fn expected_mining_time(&self, miner: &Address) -> ConsensusResult<u64> {
        Ok(self.miner_info(miner).await?.expected_mining_time)
    }

    /// Milliseconds from now until `miner`'s slot starts; negative once it
    /// has passed.
    ///
    /// Never fails: without a round (or without the miner in it) the
    /// default schedule entry is used, whose slot is the epoch.
    pub async fn distance_to_time_slot(&self, miner: &Address) -> i64 {
        let now = self.now_ms();
        let expected = match self.miner_info(miner).await {
            Ok(info) => info.expected_mining_time,
            Err(e) => {
                debug!(miner = %hex::encode(miner), error = %e, "Using default time slot");
                MinerInRound::default().expected_mining_time
            }
        };
        let distance = i128::from(expected) - i128::from(now);
        i64::try_from(distance).unwrap_or(if distance < 0 { i64::MIN } else { i64::MAX })
    }

    /// Miner whose slot contains the current time.
    pub async fn current_miner(&self) -> Option<Address> {
        let round = self.current_round().await?;
        round
            .miner_at(self.now_ms(), self.config.mining_interval_ms)
            .map(|m| m.address)
    }
}
