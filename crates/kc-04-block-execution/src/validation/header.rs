//! Header checks: parent linkage, height, timestamps, body commitment

use crate::config::PipelineConfig;
use crate::domain::{BlockProcessingStage, RejectReason, StageError};
use crate::ports::BlockValidationProvider;
use async_trait::async_trait;
use kc_01_state_storage::BlockchainStore;
use kc_02_consensus_rounds::{SystemTimeSource, TimeSource};
use kc_03_parallel_execution::algorithms::roots::transactions_root;
use shared_types::{short_hex, Block};
use std::sync::Arc;

pub struct BlockHeaderValidationProvider {
    blockchain_store: Arc<dyn BlockchainStore>,
    config: PipelineConfig,
    time_source: Arc<dyn TimeSource>,
}

impl BlockHeaderValidationProvider {
    pub fn new(blockchain_store: Arc<dyn BlockchainStore>, config: PipelineConfig) -> Self {
        Self {
            blockchain_store,
            config,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }
}

#[async_trait]
impl BlockValidationProvider for BlockHeaderValidationProvider {
    fn name(&self) -> &'static str {
        "header"
    }

    async fn validate_before_execute(&self, block: &Block) -> Result<(), StageError> {
        let header = &block.header;
        if header.is_genesis() {
            return Err(RejectReason::structural("genesis block cannot be attached").into());
        }

        let ids = block.transaction_ids();
        if ids.len() > self.config.max_transactions_per_block {
            return Err(RejectReason::structural(format!(
                "too many transactions: {} > {}",
                ids.len(),
                self.config.max_transactions_per_block
            ))
            .into());
        }
        if header.merkle_tree_root_of_transactions != transactions_root(ids) {
            return Err(RejectReason::structural("transaction root does not match body").into());
        }

        let parent = self
            .blockchain_store
            .get_block_by_hash(&header.previous_block_hash)
            .await?
            .ok_or_else(|| {
                RejectReason::structural(format!(
                    "unknown parent {}",
                    short_hex(&header.previous_block_hash)
                ))
            })?;

        if header.height != parent.height() + 1 {
            return Err(RejectReason::structural(format!(
                "invalid height: expected {}, got {}",
                parent.height() + 1,
                header.height
            ))
            .into());
        }

        if header.timestamp <= parent.header.timestamp {
            return Err(RejectReason::validation(
                BlockProcessingStage::ValidatingPre,
                format!(
                    "timestamp {} not after parent {}",
                    header.timestamp, parent.header.timestamp
                ),
            )
            .into());
        }

        let now = self.time_source.now_ms();
        if header.timestamp > now + self.config.max_future_drift_ms {
            return Err(RejectReason::retry_later(format!(
                "timestamp {} is {} ms ahead of local time",
                header.timestamp,
                header.timestamp - now
            ))
            .into());
        }

        Ok(())
    }
}
