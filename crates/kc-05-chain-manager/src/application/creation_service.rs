//! Chain Creation Service

use super::chain_manager::ChainManager;
use crate::config::ChainConfig;
use crate::domain::{ChainError, ChainResult};
use crate::ports::ChainCreationApi;
use async_trait::async_trait;
use kc_04_block_execution::BlockExecutionApi;
use shared_bus::{BlockchainEvent, EventPublisher};
use shared_types::{short_hex, BlockHeader, Chain, Transaction, EMPTY_HASH, GENESIS_HEIGHT};
use std::sync::Arc;
use tracing::{error, info};

pub struct ChainCreationService {
    chain_manager: Arc<ChainManager>,
    pipeline: Arc<dyn BlockExecutionApi>,
    publisher: Arc<dyn EventPublisher>,
    config: ChainConfig,
}

impl ChainCreationService {
    pub fn new(
        chain_manager: Arc<ChainManager>,
        pipeline: Arc<dyn BlockExecutionApi>,
        publisher: Arc<dyn EventPublisher>,
        config: ChainConfig,
    ) -> Self {
        Self {
            chain_manager,
            pipeline,
            publisher,
            config,
        }
    }

    fn genesis_header(&self) -> BlockHeader {
        BlockHeader {
            chain_id: self.config.chain_id,
            height: GENESIS_HEIGHT,
            previous_block_hash: EMPTY_HASH,
            timestamp: self.config.genesis_timestamp,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChainCreationApi for ChainCreationService {
    async fn create_new_chain(&self, genesis_transactions: Vec<Transaction>) -> ChainResult<Chain> {
        if self.chain_manager.get_chain().is_some() {
            return Err(ChainError::ChainAlreadyCreated);
        }

        let tx_count = genesis_transactions.len();
        let executed = self
            .pipeline
            .execute_genesis(self.genesis_header(), genesis_transactions.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "Create new chain failed");
                ChainError::from(e)
            })?;

        let chain = self
            .chain_manager
            .create_chain(executed.block.clone(), genesis_transactions)
            .await?;

        info!(
            genesis = %short_hex(&chain.genesis_block_hash),
            tx_count,
            "New chain created"
        );
        self.publisher
            .publish(BlockchainEvent::BestChainFound {
                block_hash: chain.genesis_block_hash,
                block_height: chain.best_chain_height,
                block_executed_sets: vec![executed],
            })
            .await;
        Ok(chain)
    }
}
