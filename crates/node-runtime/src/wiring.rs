//! # Service Wiring
//!
//! Builds every kernel service over the in-memory adapters and connects
//! them through their ports.
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │  BlockAttachService  │──── events ───→ InMemoryEventBus
//!                 └──────────┬───────────┘
//!                            │ process_block
//!                 ┌──────────▼───────────┐
//!                 │ BlockExecutionPipeline│── header / consensus / execution-result
//!                 └──────────┬───────────┘
//!                            │ execute_batch
//!              ┌─────────────▼──────────────┐
//!              │ ParallelExecutionCoordinator│── SystemContractExecutor
//!              └─────────────┬──────────────┘
//!                            │ get / commit_delta
//!                    InMemoryStateStore
//! ```
//!
//! The round scheduler reads at the chain manager's best chain version, so
//! the chain manager is built before the scheduler and the pipeline.

use crate::config::NodeConfig;
use crate::contracts::{SystemAccessAnalyzer, SystemContractExecutor};
use kc_01_state_storage::{
    InMemoryBlockchainStore, InMemoryStateStore, InMemoryTransactionResultStore,
};
use kc_02_consensus_rounds::{ConsensusRoundScheduler, SystemTimeSource, TimeSource};
use kc_03_parallel_execution::ParallelExecutionCoordinator;
use kc_04_block_execution::{
    BlockExecutionPipeline, BlockHeaderValidationProvider, ConsensusValidationProvider,
    ExecutionResultValidationProvider,
};
use kc_05_chain_manager::{BlockAttachService, ChainCreationService, ChainManager};
use shared_bus::InMemoryEventBus;
use std::sync::Arc;
use tracing::info;

/// Every service of a running node.
pub struct NodeServices {
    pub blockchain_store: Arc<InMemoryBlockchainStore>,
    pub result_store: Arc<InMemoryTransactionResultStore>,
    pub state_store: Arc<InMemoryStateStore>,
    pub coordinator: Arc<ParallelExecutionCoordinator>,
    pub chain_manager: Arc<ChainManager>,
    pub scheduler: Arc<ConsensusRoundScheduler>,
    pub pipeline: Arc<BlockExecutionPipeline>,
    pub event_bus: Arc<InMemoryEventBus>,
    pub creation: Arc<ChainCreationService>,
    pub attach: Arc<BlockAttachService>,
}

impl NodeServices {
    pub fn build(config: &NodeConfig) -> Self {
        Self::build_with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Same as `build`, with every clock read going through `time_source`.
    pub fn build_with_time_source(config: &NodeConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let contract = config.consensus.consensus_contract;

        // Storage
        let blockchain_store = Arc::new(InMemoryBlockchainStore::new(config.chain.chain_id));
        let result_store = Arc::new(InMemoryTransactionResultStore::new());
        let state_store = Arc::new(InMemoryStateStore::new());

        // Execution
        let coordinator = Arc::new(ParallelExecutionCoordinator::with_config(
            Arc::new(SystemAccessAnalyzer::new(contract)),
            Arc::new(SystemContractExecutor::new(contract)),
            state_store.clone(),
            config.execution.clone(),
        ));

        // Chain and consensus
        let chain_manager = Arc::new(ChainManager::new(blockchain_store.clone()));
        let scheduler = Arc::new(
            ConsensusRoundScheduler::new(
                state_store.clone(),
                chain_manager.clone(),
                config.consensus.clone(),
            )
            .with_time_source(time_source.clone()),
        );

        // Pipeline, providers run in registration order
        let pipeline = Arc::new(
            BlockExecutionPipeline::new(
                blockchain_store.clone(),
                result_store.clone(),
                state_store.clone(),
                coordinator.clone(),
            )
            .with_validation_provider(Arc::new(
                BlockHeaderValidationProvider::new(blockchain_store.clone(), config.pipeline.clone())
                    .with_time_source(time_source),
            ))
            .with_validation_provider(Arc::new(ConsensusValidationProvider::new(
                scheduler.clone(),
            )))
            .with_validation_provider(Arc::new(ExecutionResultValidationProvider::new())),
        );

        // Events and chain services
        let event_bus = Arc::new(InMemoryEventBus::new());
        let creation = Arc::new(ChainCreationService::new(
            chain_manager.clone(),
            pipeline.clone(),
            event_bus.clone(),
            config.chain.clone(),
        ));
        let attach = Arc::new(BlockAttachService::new(
            chain_manager.clone(),
            blockchain_store.clone(),
            pipeline.clone(),
            event_bus.clone(),
        ));

        info!(
            chain_id = config.chain.chain_id,
            providers = ?pipeline.provider_names(),
            parallel = config.execution.enable_parallel,
            "Node services wired"
        );

        Self {
            blockchain_store,
            result_store,
            state_store,
            coordinator,
            chain_manager,
            scheduler,
            pipeline,
            event_bus,
            creation,
            attach,
        }
    }
}
