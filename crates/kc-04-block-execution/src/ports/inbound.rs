//! Driving port used by the chain manager

use crate::domain::{BlockProcessOutcome, PipelineResult};
use async_trait::async_trait;
use shared_types::{Block, BlockExecutedSet, BlockHeader, Transaction};

#[async_trait]
pub trait BlockExecutionApi: Send + Sync {
    /// Validate, execute and commit `block` on top of its parent's state.
    async fn process_block(&self, block: &Block) -> BlockProcessOutcome;

    /// Execute and commit the genesis batch. No pre-validation and no
    /// declared hash to compare against.
    async fn execute_genesis(
        &self,
        header: BlockHeader,
        transactions: Vec<Transaction>,
    ) -> PipelineResult<BlockExecutedSet>;
}
