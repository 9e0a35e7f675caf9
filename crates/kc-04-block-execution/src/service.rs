//! Block Execution Pipeline
//!
//! Validate, execute, validate again, then persist. Link status and
//! rollback belong to the caller.

use crate::domain::{
    BlockProcessOutcome, BlockProcessingStage, PipelineResult, RejectReason, StageError,
};
use crate::ports::{BlockExecutionApi, BlockValidationProvider};
use async_trait::async_trait;
use kc_01_state_storage::{
    BlockchainStore, StateDelta, StateStore, StateVersion, TransactionResultStore,
};
use kc_03_parallel_execution::ParallelExecutionApi;
use shared_types::{
    short_hex, Block, BlockExecutedSet, BlockHeader, Hash, Transaction, TransactionResult,
};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What the executing stage produced.
struct Executed {
    set: BlockExecutedSet,
    /// `None` when the set was rebuilt from an earlier execution
    delta: Option<StateDelta>,
}

pub struct BlockExecutionPipeline {
    blockchain_store: Arc<dyn BlockchainStore>,
    result_store: Arc<dyn TransactionResultStore>,
    state_store: Arc<dyn StateStore>,
    executor: Arc<dyn ParallelExecutionApi>,
    providers: Vec<Arc<dyn BlockValidationProvider>>,
}

impl BlockExecutionPipeline {
    pub fn new(
        blockchain_store: Arc<dyn BlockchainStore>,
        result_store: Arc<dyn TransactionResultStore>,
        state_store: Arc<dyn StateStore>,
        executor: Arc<dyn ParallelExecutionApi>,
    ) -> Self {
        Self {
            blockchain_store,
            result_store,
            state_store,
            executor,
            providers: Vec::new(),
        }
    }

    /// Register a validation provider; providers run in registration order.
    pub fn with_validation_provider(mut self, provider: Arc<dyn BlockValidationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn parent_version(block: &Block) -> StateVersion {
        if block.header.is_genesis() {
            StateVersion::EMPTY
        } else {
            StateVersion::of_block(block.previous_block_hash())
        }
    }

    // === STAGES ===

    pub async fn validate_before_execute(&self, block: &Block) -> Result<(), StageError> {
        for provider in &self.providers {
            trace!(provider = provider.name(), "Pre-execution validation");
            provider.validate_before_execute(block).await?;
        }
        Ok(())
    }

    pub async fn validate_after_execute(
        &self,
        block: &Block,
        executed: &BlockExecutedSet,
    ) -> Result<(), StageError> {
        for provider in &self.providers {
            trace!(provider = provider.name(), "Post-execution validation");
            provider.validate_after_execute(block, executed).await?;
        }
        Ok(())
    }

    /// Execute `block`, or rebuild its executed set if it already ran.
    async fn execute(&self, block: &Block) -> Result<Executed, StageError> {
        let block_hash = block.hash();

        if self.state_store.version_rooted_at(&block_hash).await?.is_some() {
            info!(block_hash = %short_hex(&block_hash), "Block already executed");
            let set = self.rebuild_executed_set(&block_hash).await?;
            return Ok(Executed { set, delta: None });
        }

        let transactions = self
            .blockchain_store
            .get_transactions(block.transaction_ids())
            .await?;
        let output = self
            .executor
            .execute_batch(&block.header, &transactions, Self::parent_version(block))
            .await?;

        let recomputed = output.block.hash();
        if recomputed != block_hash {
            warn!(
                block_hash = %short_hex(&block_hash),
                recomputed = %short_hex(&recomputed),
                header = ?output.block.header,
                "Block execution result does not match declared hash"
            );
            return Err(RejectReason::mismatch(
                BlockProcessingStage::Executing,
                format!(
                    "recomputed hash {} differs from declared {}",
                    short_hex(&recomputed),
                    short_hex(&block_hash)
                ),
            )
            .into());
        }

        Ok(Executed {
            set: BlockExecutedSet::new(output.block, transactions, output.transaction_results),
            delta: Some(output.merged_delta),
        })
    }

    /// Executed set of a block from persisted data.
    ///
    /// The stored block must hash to `block_hash` and every result must be
    /// present; anything else is a validation failure.
    async fn rebuild_executed_set(&self, block_hash: &Hash) -> Result<BlockExecutedSet, StageError> {
        let stored = self
            .blockchain_store
            .get_block_by_hash(block_hash)
            .await?
            .ok_or_else(|| {
                RejectReason::validation(
                    BlockProcessingStage::Executing,
                    format!("executed block {} missing from storage", short_hex(block_hash)),
                )
            })?;

        if stored.hash() != *block_hash {
            return Err(RejectReason::validation(
                BlockProcessingStage::Executing,
                format!("stored block does not hash to {}", short_hex(block_hash)),
            )
            .into());
        }

        let transactions = self
            .blockchain_store
            .get_transactions(stored.transaction_ids())
            .await?;

        let mut results = Vec::with_capacity(transactions.len());
        for id in stored.transaction_ids() {
            let result = self
                .result_store
                .get_transaction_result(id, block_hash)
                .await?
                .ok_or_else(|| {
                    warn!(
                        block_hash = %short_hex(block_hash),
                        tx = %short_hex(id),
                        "Failed to load transaction result"
                    );
                    RejectReason::validation(
                        BlockProcessingStage::Executing,
                        format!("missing result for transaction {}", short_hex(id)),
                    )
                })?;
            results.push(result);
        }

        Ok(BlockExecutedSet::new(stored, transactions, results))
    }

    /// Persist results first, then seal the state version.
    ///
    /// A sealed version therefore always has its results stored, which is
    /// what the re-execution short-circuit relies on.
    async fn commit(
        &self,
        block_hash: Hash,
        parent: StateVersion,
        results: Vec<TransactionResult>,
        delta: StateDelta,
    ) -> PipelineResult<StateVersion> {
        for result in results {
            self.result_store.add_transaction_result(result).await?;
        }
        let version = self.state_store.commit_delta(block_hash, parent, delta).await?;
        Ok(version)
    }

    async fn run(&self, block: &Block) -> Result<BlockExecutedSet, StageError> {
        let block_hash = block.hash();
        let mut stage = BlockProcessingStage::ValidatingPre;
        trace!(block_hash = %short_hex(&block_hash), %stage, "Processing block");

        self.validate_before_execute(block).await?;

        stage = BlockProcessingStage::Executing;
        trace!(block_hash = %short_hex(&block_hash), %stage, "Processing block");
        let executed = self.execute(block).await?;

        stage = BlockProcessingStage::ValidatingPost;
        trace!(block_hash = %short_hex(&block_hash), %stage, "Processing block");
        self.validate_after_execute(block, &executed.set).await?;

        if let Some(delta) = executed.delta {
            let results = executed.set.ordered_results().into_iter().cloned().collect();
            self.commit(block_hash, Self::parent_version(block), results, delta)
                .await?;
        }

        stage = BlockProcessingStage::Committed;
        debug!(
            block_hash = %short_hex(&block_hash),
            block_height = block.height(),
            %stage,
            "Block processed"
        );
        Ok(executed.set)
    }
}

#[async_trait]
impl BlockExecutionApi for BlockExecutionPipeline {
    async fn process_block(&self, block: &Block) -> BlockProcessOutcome {
        match self.run(block).await {
            Ok(set) => BlockProcessOutcome::Committed(set),
            Err(StageError::Rejected(reason)) => {
                warn!(
                    block_hash = %short_hex(&block.hash()),
                    block_height = block.height(),
                    %reason,
                    "Block rejected"
                );
                BlockProcessOutcome::Rejected(reason)
            }
            Err(StageError::Aborted(error)) => BlockProcessOutcome::Aborted(error),
        }
    }

    async fn execute_genesis(
        &self,
        header: BlockHeader,
        transactions: Vec<Transaction>,
    ) -> PipelineResult<BlockExecutedSet> {
        let output = self
            .executor
            .execute_batch(&header, &transactions, StateVersion::EMPTY)
            .await?;
        let block_hash = output.block.hash();

        self.commit(
            block_hash,
            StateVersion::EMPTY,
            output.transaction_results.clone(),
            output.merged_delta,
        )
        .await?;

        info!(
            block_hash = %short_hex(&block_hash),
            tx_count = transactions.len(),
            "Genesis block executed"
        );
        Ok(BlockExecutedSet::new(
            output.block,
            transactions,
            output.transaction_results,
        ))
    }
}
