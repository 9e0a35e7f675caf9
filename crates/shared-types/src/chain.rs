//! # Chain Entities
//!
//! - `ChainBlockLink`: edge from a block to its parent plus execution status.
//! - `Chain`: the single pointer record (best, longest, genesis, branch tips).
//! - `BlockExecutedSet`: the transient bundle produced by executing one block.
//! - `BlockAttachOperationStatus`: what recording a link did to the chain.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::entities::{Block, Hash, Transaction, TransactionResult};

/// Execution status of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChainBlockLinkExecutionStatus {
    #[default]
    NotExecuted,
    ExecutionSuccess,
    ExecutionFailed,
}

/// Edge record connecting a block to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBlockLink {
    pub block_hash: Hash,
    pub previous_block_hash: Hash,
    pub height: u64,
    pub execution_status: ChainBlockLinkExecutionStatus,
}

impl ChainBlockLink {
    /// Fresh, not yet executed link for a block.
    pub fn for_block(block: &Block) -> Self {
        Self {
            block_hash: block.hash(),
            previous_block_hash: block.previous_block_hash(),
            height: block.height(),
            execution_status: ChainBlockLinkExecutionStatus::NotExecuted,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.execution_status == ChainBlockLinkExecutionStatus::ExecutionSuccess
    }

    pub fn is_failed(&self) -> bool {
        self.execution_status == ChainBlockLinkExecutionStatus::ExecutionFailed
    }
}

/// The chain pointer record. One per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: u32,
    pub genesis_block_hash: Hash,
    pub best_chain_hash: Hash,
    pub best_chain_height: u64,
    pub longest_chain_hash: Hash,
    pub longest_chain_height: u64,
    /// Tip hash to tip height of every known branch.
    pub branches: BTreeMap<Hash, u64>,
}

impl Chain {
    /// Chain rooted at an executed genesis block.
    pub fn new(id: u32, genesis_block_hash: Hash, genesis_height: u64) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(genesis_block_hash, genesis_height);
        Self {
            id,
            genesis_block_hash,
            best_chain_hash: genesis_block_hash,
            best_chain_height: genesis_height,
            longest_chain_hash: genesis_block_hash,
            longest_chain_height: genesis_height,
            branches,
        }
    }
}

/// Result of recording a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAttachOperationStatus {
    /// The link was already known with the same parent.
    AlreadyLinked,
    /// The link started or extended a branch that is not the longest one.
    Forked,
    /// The link extended the current longest chain.
    ExtendedLongestChain,
    /// The link's branch replaced the previous longest chain.
    ReplacedLongestChain,
}

impl BlockAttachOperationStatus {
    /// True when the longest chain moved and its links need executing.
    pub fn longest_chain_found(self) -> bool {
        matches!(
            self,
            Self::ExtendedLongestChain | Self::ReplacedLongestChain
        )
    }
}

/// A block plus its transactions and results from one execution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExecutedSet {
    pub block: Block,
    pub transaction_map: HashMap<Hash, Transaction>,
    pub transaction_result_map: HashMap<Hash, TransactionResult>,
}

impl BlockExecutedSet {
    pub fn new(block: Block, transactions: Vec<Transaction>, results: Vec<TransactionResult>) -> Self {
        let transaction_map = transactions.into_iter().map(|tx| (tx.hash(), tx)).collect();
        let transaction_result_map = results
            .into_iter()
            .map(|r| (r.transaction_id, r))
            .collect();
        Self {
            block,
            transaction_map,
            transaction_result_map,
        }
    }

    pub fn block_hash(&self) -> Hash {
        self.block.hash()
    }

    pub fn height(&self) -> u64 {
        self.block.height()
    }

    /// Transaction ids in block order.
    pub fn transaction_ids(&self) -> &[Hash] {
        self.block.transaction_ids()
    }

    /// Results in block order.
    pub fn ordered_results(&self) -> Vec<&TransactionResult> {
        self.transaction_ids()
            .iter()
            .filter_map(|id| self.transaction_result_map.get(id))
            .collect()
    }
}
