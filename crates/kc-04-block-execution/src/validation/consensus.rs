//! Producer eligibility against the round visible at the parent state

use crate::domain::{BlockProcessingStage, RejectReason, StageError};
use crate::ports::BlockValidationProvider;
use async_trait::async_trait;
use kc_01_state_storage::StateVersion;
use kc_02_consensus_rounds::ConsensusRoundScheduler;
use shared_types::Block;
use std::sync::Arc;
use tracing::debug;

pub struct ConsensusValidationProvider {
    scheduler: Arc<ConsensusRoundScheduler>,
}

impl ConsensusValidationProvider {
    pub fn new(scheduler: Arc<ConsensusRoundScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl BlockValidationProvider for ConsensusValidationProvider {
    fn name(&self) -> &'static str {
        "consensus"
    }

    async fn validate_before_execute(&self, block: &Block) -> Result<(), StageError> {
        let parent_version = StateVersion::of_block(block.previous_block_hash());
        let Some(round) = self.scheduler.current_round_at(&parent_version).await else {
            debug!(block_height = block.height(), "No round at parent state, skipping producer check");
            return Ok(());
        };

        let producer = &block.header.producer;
        let Some(miner) = round.miners.get(producer) else {
            return Err(RejectReason::validation(
                BlockProcessingStage::ValidatingPre,
                format!(
                    "producer {} is not a miner of round {}",
                    hex::encode(producer),
                    round.round_number
                ),
            )
            .into());
        };

        if block.header.timestamp < miner.expected_mining_time {
            return Err(RejectReason::validation(
                BlockProcessingStage::ValidatingPre,
                format!(
                    "block produced at {} before time slot {}",
                    block.header.timestamp, miner.expected_mining_time
                ),
            )
            .into());
        }

        Ok(())
    }
}
