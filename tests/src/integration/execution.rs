//! # Parallel Execution Against the Node Contracts
//!
//! The coordinator's parallel schedule over the native contracts must give
//! exactly what running the batch in block order gives.

use kc_03_parallel_execution::{ExecutionConfig, ParallelExecutionCoordinator};
use node_runtime::{SystemAccessAnalyzer, SystemContractExecutor};
use std::sync::Arc;

/// A coordinator over `node`'s state store with parallelism switched on or
/// off.
pub fn coordinator(
    node: &crate::harness::TestNode,
    enable_parallel: bool,
) -> ParallelExecutionCoordinator {
    let contract = node.config.consensus.consensus_contract;
    let config = ExecutionConfig {
        enable_parallel,
        ..node.config.execution.clone()
    };
    ParallelExecutionCoordinator::with_config(
        Arc::new(SystemAccessAnalyzer::new(contract)),
        Arc::new(SystemContractExecutor::new(contract)),
        node.services.state_store.clone(),
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{config, miner, slot_miner, timestamp, TestNode};
    use kc_01_state_storage::StateVersion;
    use kc_03_parallel_execution::{ExecutionMode, ParallelExecutionApi};
    use node_runtime::contracts::kv;
    use proptest::prelude::*;
    use shared_types::{Block, BlockHeader, Transaction};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn header(parent: &Block) -> BlockHeader {
        BlockHeader {
            chain_id: 1,
            height: parent.height() + 1,
            previous_block_hash: parent.hash(),
            timestamp: timestamp(parent.height() + 1),
            producer: slot_miner(parent.height() + 1),
            ..Default::default()
        }
    }

    /// Eight senders, two key collisions, one failing transfer.
    fn mostly_independent_batch() -> Vec<Transaction> {
        vec![
            kv::increment(miner(10), "k0", 50),
            kv::increment(miner(11), "k1", 5),
            kv::increment(miner(12), "k2", 7),
            kv::transfer(miner(13), "k0", "k3", 20),
            kv::transfer(miner(14), "k2", "k4", 100),
            kv::set(miner(15), "k5", b"v".to_vec()),
            kv::increment(miner(16), "k6", 1),
            kv::increment(miner(17), "k7", 2),
        ]
    }

    // =============================================================================
    // INTEGRATION TESTS: PARALLEL == SEQUENTIAL
    // =============================================================================

    #[tokio::test]
    async fn test_parallel_batch_matches_sequential() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;
        let txs = mostly_independent_batch();
        let parent = StateVersion::of_block(genesis.hash());

        let parallel = coordinator(&node, true)
            .execute_batch(&header(&genesis), &txs, parent)
            .await
            .unwrap();
        let sequential = coordinator(&node, false)
            .execute_batch(&header(&genesis), &txs, parent)
            .await
            .unwrap();

        assert_eq!(parallel.mode, ExecutionMode::Parallel);
        assert_eq!(sequential.mode, ExecutionMode::Sequential);
        assert!(parallel.schedule.width() > 1);

        assert_eq!(parallel.merged_delta, sequential.merged_delta);
        assert_eq!(parallel.transaction_results, sequential.transaction_results);
        assert_eq!(parallel.block.hash(), sequential.block.hash());

        assert!(parallel.transaction_results[4].is_failed());
        assert_eq!(
            kv::decode_counter(parallel.merged_delta.get(&kv::key("k0")).map(Vec::as_slice)),
            30
        );
        assert_eq!(
            kv::decode_counter(parallel.merged_delta.get(&kv::key("k3")).map(Vec::as_slice)),
            20
        );
    }

    #[tokio::test]
    async fn test_parallel_execution_leaves_parent_state_untouched() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;

        coordinator(&node, true)
            .execute_batch(
                &header(&genesis),
                &mostly_independent_batch(),
                StateVersion::of_block(genesis.hash()),
            )
            .await
            .unwrap();

        assert_eq!(node.counter(&genesis, "k0").await, 0);
        assert_eq!(node.counter(&genesis, "k6").await, 0);
    }

    #[tokio::test]
    async fn test_same_sender_batch_is_ordered() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;
        let txs = vec![
            kv::increment(miner(1), "pot", 10),
            kv::transfer(miner(1), "pot", "out", 10),
            kv::transfer(miner(1), "pot", "out", 1),
        ];

        let output = coordinator(&node, true)
            .execute_batch(&header(&genesis), &txs, StateVersion::of_block(genesis.hash()))
            .await
            .unwrap();

        let failed: Vec<bool> = output
            .transaction_results
            .iter()
            .map(|r| r.is_failed())
            .collect();
        assert_eq!(failed, vec![false, false, true]);
    }

    fn arb_tx() -> impl Strategy<Value = Transaction> {
        let keys = prop::sample::select(vec!["a", "b", "c", "d", "e", "f"]);
        (0u8..6, 0u8..3, keys.clone(), keys, 1u64..50).prop_map(
            |(sender, method, from_key, to_key, amount)| match method {
                0 => kv::increment(miner(sender), from_key, amount),
                1 => kv::transfer(miner(sender), from_key, to_key, amount),
                _ => kv::set(miner(sender), from_key, amount.to_le_bytes().to_vec()),
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_parallel_equals_sequential_over_node_contracts(
            txs in prop::collection::vec(arb_tx(), 0..16)
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let (parallel, sequential) = runtime.block_on(async {
                let node = TestNode::new(config());
                let genesis = node.create_chain().await;
                let parent = StateVersion::of_block(genesis.hash());
                let parallel = coordinator(&node, true)
                    .execute_batch(&header(&genesis), &txs, parent)
                    .await
                    .unwrap();
                let sequential = coordinator(&node, false)
                    .execute_batch(&header(&genesis), &txs, parent)
                    .await
                    .unwrap();
                (parallel, sequential)
            });

            prop_assert_eq!(&parallel.merged_delta, &sequential.merged_delta);
            prop_assert_eq!(&parallel.transaction_results, &sequential.transaction_results);
            prop_assert_eq!(parallel.block.hash(), sequential.block.hash());
        }
    }
}
