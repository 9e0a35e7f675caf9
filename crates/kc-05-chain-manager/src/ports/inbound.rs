//! Driving ports of the chain manager

use crate::domain::{AttachCycle, AttachOutcome, ChainResult};
use async_trait::async_trait;
use shared_types::{Block, BlockAttachOperationStatus, Chain, Transaction};

#[async_trait]
pub trait BlockAttachApi: Send + Sync {
    /// Store `block`, record its link and, if the longest chain moved,
    /// execute the links attached to it.
    async fn attach_block(&self, block: Block) -> ChainResult<AttachOutcome>;

    /// Run one attachment cycle when `status` says the longest chain moved.
    async fn execute_blocks_attached_to_longest_chain(
        &self,
        status: BlockAttachOperationStatus,
    ) -> ChainResult<AttachCycle>;
}

#[async_trait]
pub trait ChainCreationApi: Send + Sync {
    /// Execute the genesis transactions in a height-0 block and root the
    /// chain at it.
    async fn create_new_chain(&self, genesis_transactions: Vec<Transaction>) -> ChainResult<Chain>;
}
