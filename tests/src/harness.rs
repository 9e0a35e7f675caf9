//! # Test Node
//!
//! The node's service wiring over a manual clock, plus helpers to produce
//! blocks on one node and hand them to another.
//!
//! Every node built from the same [`NodeConfig`] creates the same genesis
//! block, so blocks produced on one node attach on any other.

use async_trait::async_trait;
use kc_01_state_storage::{
    BlockchainStore, StateStore, StateVersion, TransactionResultStore,
};
use kc_02_consensus_rounds::ManualTimeSource;
use kc_03_parallel_execution::ParallelExecutionApi;
use kc_04_block_execution::{
    BlockExecutionPipeline, BlockHeaderValidationProvider, BlockProcessingStage,
    BlockValidationProvider, ConsensusValidationProvider, ExecutionResultValidationProvider,
    RejectReason, StageError,
};
use kc_05_chain_manager::{
    AttachOutcome, BlockAttachApi, BlockAttachService, ChainCreationApi, ChainResult,
};
use node_runtime::contracts::kv;
use node_runtime::{GenesisBuilder, NodeConfig, NodeServices};
use parking_lot::Mutex;
use shared_bus::{EventFilter, Subscription};
use shared_types::{
    Address, Block, BlockExecutedSet, BlockHeader, Chain, Hash, Transaction, TransactionResult,
};
use std::collections::HashSet;
use std::sync::Arc;

// =============================================================================
// FIXTURES
// =============================================================================

/// Local time every test node starts at (ms).
pub const NOW: u64 = 1_000_000;

/// Slot length of the test schedule (ms).
pub const MINING_INTERVAL_MS: u64 = 4_000;

pub fn miner(b: u8) -> Address {
    [b; 20]
}

/// Miners of the first round, in slot order.
pub fn genesis_miners() -> Vec<Address> {
    vec![miner(1), miner(2), miner(3)]
}

/// Genesis at time 0 with three miners. Round 1 slots start at 4s, 8s and
/// 12s, well behind [`NOW`].
pub fn config() -> NodeConfig {
    let mut config = NodeConfig {
        genesis_miners: genesis_miners(),
        ..Default::default()
    };
    config.chain.genesis_timestamp = 0;
    config.consensus.mining_interval_ms = MINING_INTERVAL_MS;
    config
}

/// In-the-past timestamp for a block at `height`.
pub fn timestamp(height: u64) -> u64 {
    NOW - 500_000 + height * 1_000
}

/// Miner rotating through the genesis miners by height.
pub fn slot_miner(height: u64) -> Address {
    let miners = genesis_miners();
    miners[(height as usize) % miners.len()]
}

// =============================================================================
// POST-VALIDATION FAULT
// =============================================================================

/// Fails post-execution validation of chosen blocks.
#[derive(Default)]
pub struct PostValidationFault {
    rejected: Mutex<HashSet<Hash>>,
}

impl PostValidationFault {
    pub fn reject(&self, block: &Block) {
        self.rejected.lock().insert(block.hash());
    }
}

#[async_trait]
impl BlockValidationProvider for PostValidationFault {
    fn name(&self) -> &'static str {
        "post-validation-fault"
    }

    async fn validate_after_execute(
        &self,
        block: &Block,
        _executed: &BlockExecutedSet,
    ) -> Result<(), StageError> {
        if self.rejected.lock().contains(&block.hash()) {
            return Err(RejectReason::mismatch(
                BlockProcessingStage::ValidatingPost,
                "world state root differs from header",
            )
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// TEST NODE
// =============================================================================

pub struct TestNode {
    pub config: NodeConfig,
    pub clock: Arc<ManualTimeSource>,
    pub services: NodeServices,
    attach: Arc<dyn BlockAttachApi>,
}

impl TestNode {
    pub fn new(config: NodeConfig) -> Self {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let services = NodeServices::build_with_time_source(&config, clock.clone());
        let attach = services.attach.clone();
        Self {
            config,
            clock,
            services,
            attach,
        }
    }

    /// A node whose pipeline runs [`PostValidationFault`] after the
    /// standard providers.
    pub fn with_post_validation_fault(config: NodeConfig) -> (Self, Arc<PostValidationFault>) {
        let mut node = Self::new(config);
        let fault = Arc::new(PostValidationFault::default());
        let services = &node.services;

        let pipeline = Arc::new(
            BlockExecutionPipeline::new(
                services.blockchain_store.clone(),
                services.result_store.clone(),
                services.state_store.clone(),
                services.coordinator.clone(),
            )
            .with_validation_provider(Arc::new(
                BlockHeaderValidationProvider::new(
                    services.blockchain_store.clone(),
                    node.config.pipeline.clone(),
                )
                .with_time_source(node.clock.clone()),
            ))
            .with_validation_provider(Arc::new(ConsensusValidationProvider::new(
                services.scheduler.clone(),
            )))
            .with_validation_provider(Arc::new(ExecutionResultValidationProvider::new()))
            .with_validation_provider(fault.clone()),
        );

        node.attach = Arc::new(BlockAttachService::new(
            services.chain_manager.clone(),
            services.blockchain_store.clone(),
            pipeline,
            services.event_bus.clone(),
        ));
        (node, fault)
    }

    pub async fn create_chain(&self) -> Block {
        let genesis = GenesisBuilder::from_config(&self.config)
            .build()
            .expect("genesis transactions");
        self.create_chain_with(genesis).await
    }

    pub async fn create_chain_with(&self, transactions: Vec<Transaction>) -> Block {
        let chain = self
            .services
            .creation
            .create_new_chain(transactions)
            .await
            .expect("chain created");
        self.block(&chain.genesis_block_hash).await
    }

    pub fn events(&self) -> Subscription {
        self.services.event_bus.subscribe(EventFilter::all())
    }

    pub fn chain(&self) -> Chain {
        self.services
            .chain_manager
            .get_chain()
            .expect("chain created")
    }

    pub async fn block(&self, hash: &Hash) -> Block {
        self.services
            .blockchain_store
            .get_block_by_hash(hash)
            .await
            .expect("blockchain store")
            .expect("block stored")
    }

    pub async fn best_block(&self) -> Block {
        self.block(&self.chain().best_chain_hash).await
    }

    /// Execute `transactions` on top of `parent` and return the stamped
    /// block without attaching it.
    pub async fn build_block(
        &self,
        parent: &Block,
        producer: Address,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Block {
        let header = BlockHeader {
            chain_id: self.config.chain.chain_id,
            height: parent.height() + 1,
            previous_block_hash: parent.hash(),
            timestamp,
            producer,
            ..Default::default()
        };
        self.services
            .blockchain_store
            .add_transactions(transactions.clone())
            .await
            .expect("transactions stored");
        self.services
            .coordinator
            .execute_batch(&header, &transactions, StateVersion::of_block(parent.hash()))
            .await
            .expect("batch executed")
            .block
    }

    pub async fn attach(&self, block: Block) -> ChainResult<AttachOutcome> {
        self.attach.attach_block(block).await
    }

    /// Build a block on `parent` and attach it; the best chain must move.
    pub async fn mine(
        &self,
        parent: &Block,
        producer: Address,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Block {
        let block = self
            .build_block(parent, producer, timestamp, transactions)
            .await;
        let outcome = self.attach(block.clone()).await.expect("block attached");
        assert!(
            outcome.best_chain_advanced(),
            "block {} did not advance the best chain: {:?}",
            block.height(),
            outcome
        );
        block
    }

    /// Mine `count` blocks on the best chain, asking `transactions` for the
    /// body of each height.
    pub async fn mine_chain<F>(&self, count: u64, mut transactions: F) -> Vec<Block>
    where
        F: FnMut(u64) -> Vec<Transaction>,
    {
        let mut tip = self.best_block().await;
        let mut blocks = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let height = tip.height() + 1;
            tip = self
                .mine(&tip, slot_miner(height), timestamp(height), transactions(height))
                .await;
            blocks.push(tip.clone());
        }
        blocks
    }

    /// Hand `block`, produced on `from`, to this node.
    pub async fn deliver(&self, from: &TestNode, block: &Block) -> ChainResult<AttachOutcome> {
        let transactions = from
            .services
            .blockchain_store
            .get_transactions(block.transaction_ids())
            .await
            .expect("producer has the body");
        self.services
            .blockchain_store
            .add_transactions(transactions)
            .await
            .expect("transactions stored");
        self.attach(block.clone()).await
    }

    /// Results of `block` in body order.
    pub async fn results(&self, block: &Block) -> Vec<TransactionResult> {
        let mut results = Vec::with_capacity(block.transaction_ids().len());
        for id in block.transaction_ids() {
            let result = self
                .services
                .result_store
                .get_transaction_result(id, &block.hash())
                .await
                .expect("result store")
                .expect("result stored");
            results.push(result);
        }
        results
    }

    /// Key/value counter as seen after `block`.
    pub async fn counter(&self, block: &Block, name: &str) -> u64 {
        let stored = self
            .services
            .state_store
            .get(&StateVersion::of_block(block.hash()), &kv::key(name))
            .await
            .expect("state version exists");
        kv::decode_counter(stored.as_deref())
    }
}
