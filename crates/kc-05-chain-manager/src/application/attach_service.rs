//! Block Attach Service
//!
//! Drives one attachment cycle at a time: the unexecuted links of the
//! longest chain go through the pipeline in height order. The best chain
//! moves to the last block of the committed run, and only once the store
//! has accepted the new pointer.

use super::chain_manager::ChainManager;
use crate::domain::{AttachCycle, AttachOutcome, ChainError, ChainResult};
use crate::ports::BlockAttachApi;
use async_trait::async_trait;
use kc_01_state_storage::BlockchainStore;
use kc_04_block_execution::{BlockExecutionApi, BlockProcessOutcome, PipelineError};
use shared_bus::{BlockchainEvent, EventPublisher};
use shared_types::{
    short_hex, Block, BlockAttachOperationStatus, BlockExecutedSet, ChainBlockLink,
    ChainBlockLinkExecutionStatus, Hash, StorageError,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct BlockAttachService {
    chain_manager: Arc<ChainManager>,
    blockchain_store: Arc<dyn BlockchainStore>,
    pipeline: Arc<dyn BlockExecutionApi>,
    publisher: Arc<dyn EventPublisher>,
    /// Serialises attachment cycles
    cycle: Mutex<()>,
}

impl BlockAttachService {
    pub fn new(
        chain_manager: Arc<ChainManager>,
        blockchain_store: Arc<dyn BlockchainStore>,
        pipeline: Arc<dyn BlockExecutionApi>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            chain_manager,
            blockchain_store,
            pipeline,
            publisher,
            cycle: Mutex::new(()),
        }
    }

    async fn load_block(&self, link: &ChainBlockLink) -> Result<Block, StorageError> {
        self.blockchain_store
            .get_block_by_hash(&link.block_hash)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("block {}", short_hex(&link.block_hash))))
    }

    /// Roll back and turn an infrastructure failure into `ChainError::Aborted`.
    fn abort(&self, link: &ChainBlockLink, source: PipelineError) -> ChainError {
        error!(
            block_hash = %short_hex(&link.block_hash),
            block_height = link.height,
            error = %source,
            "Attachment aborted, rolling back longest branch"
        );
        if let Err(e) = self.chain_manager.remove_longest_branch() {
            error!(error = %e, "Failed to remove longest branch");
        }
        ChainError::Aborted {
            block: short_hex(&link.block_hash),
            source,
        }
    }

    /// Advance the best chain over `links` and announce `executed`. A store
    /// failure rolls the longest branch back and aborts.
    async fn commit(&self, links: &[ChainBlockLink], executed: &[BlockExecutedSet]) -> ChainResult<()> {
        let Some(tip) = links.last() else {
            return Ok(());
        };
        let hashes: Vec<Hash> = links.iter().map(|l| l.block_hash).collect();
        match self
            .chain_manager
            .commit_executed(&hashes, tip.height, tip.block_hash)
            .await
        {
            Ok(()) => {}
            Err(ChainError::Storage(e)) => return Err(self.abort(tip, e.into())),
            Err(e) => return Err(e),
        }

        for set in executed {
            self.publisher
                .publish(BlockchainEvent::BlockAccepted(set.clone()))
                .await;
        }
        self.publisher
            .publish(BlockchainEvent::BestChainFound {
                block_hash: tip.block_hash,
                block_height: tip.height,
                block_executed_sets: executed.to_vec(),
            })
            .await;
        Ok(())
    }

    /// Execute the unexecuted links of the longest chain. Caller holds the
    /// cycle lock.
    async fn run_cycle(&self) -> ChainResult<AttachCycle> {
        let chain = self
            .chain_manager
            .get_chain()
            .ok_or(ChainError::ChainNotCreated)?;
        let links = self
            .chain_manager
            .get_not_executed_links(&chain.longest_chain_hash);
        let (Some(first), Some(tip)) = (links.first(), links.last()) else {
            debug!(
                longest = %short_hex(&chain.longest_chain_hash),
                "No unexecuted links on longest chain"
            );
            return Ok(AttachCycle::Idle);
        };

        info!(
            from_height = first.height,
            to_height = tip.height,
            count = links.len(),
            "Executing blocks attached to longest chain"
        );

        let mut executed = Vec::with_capacity(links.len());
        for link in &links {
            let block = match self.load_block(link).await {
                Ok(block) => block,
                Err(e) => return Err(self.abort(link, e.into())),
            };

            match self.pipeline.process_block(&block).await {
                BlockProcessOutcome::Committed(set) => {
                    info!(
                        block_hash = %short_hex(&link.block_hash),
                        block_height = link.height,
                        tx_count = set.transaction_ids().len(),
                        "Block executed"
                    );
                    executed.push(set);
                }
                BlockProcessOutcome::Rejected(reason) if reason.retry_later => {
                    info!(
                        block_hash = %short_hex(&link.block_hash),
                        block_height = link.height,
                        committed = executed.len(),
                        %reason,
                        "Block deferred"
                    );
                    self.commit(&links[..executed.len()], &executed).await?;
                    return Ok(AttachCycle::Deferred {
                        block_hash: link.block_hash,
                        reason,
                        executed,
                    });
                }
                BlockProcessOutcome::Rejected(reason) => {
                    self.chain_manager.set_link_execution_status(
                        &link.block_hash,
                        ChainBlockLinkExecutionStatus::ExecutionFailed,
                    )?;
                    self.publisher
                        .publish(BlockchainEvent::BlockRejected {
                            block_hash: link.block_hash,
                            block_height: link.height,
                            reason: reason.to_string(),
                        })
                        .await;
                    let removed = self.chain_manager.remove_longest_branch()?;
                    warn!(
                        block_hash = %short_hex(&link.block_hash),
                        block_height = link.height,
                        %reason,
                        removed = removed.len(),
                        "Block rejected, longest branch discarded"
                    );
                    return Ok(AttachCycle::BranchDiscarded {
                        block_hash: link.block_hash,
                        reason,
                        removed,
                    });
                }
                BlockProcessOutcome::Aborted(e) => return Err(self.abort(link, e)),
            }
        }

        self.commit(&links, &executed).await?;

        Ok(AttachCycle::BestChainAdvanced {
            block_hash: tip.block_hash,
            block_height: tip.height,
            executed,
        })
    }
}

#[async_trait]
impl BlockAttachApi for BlockAttachService {
    async fn attach_block(&self, block: Block) -> ChainResult<AttachOutcome> {
        let _cycle = self.cycle.lock().await;

        let link = ChainBlockLink::for_block(&block);
        self.blockchain_store.add_block(block).await?;
        let status = self.chain_manager.record_block(link)?;

        let cycle = if status.longest_chain_found() {
            Some(self.run_cycle().await?)
        } else {
            None
        };
        Ok(AttachOutcome { status, cycle })
    }

    async fn execute_blocks_attached_to_longest_chain(
        &self,
        status: BlockAttachOperationStatus,
    ) -> ChainResult<AttachCycle> {
        if !status.longest_chain_found() {
            return Ok(AttachCycle::Idle);
        }
        let _cycle = self.cycle.lock().await;
        self.run_cycle().await
    }
}
