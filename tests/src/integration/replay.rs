//! # Deterministic Replay
//!
//! A block produced on one node must execute to the same hash, results and
//! state on every other node, whatever execution mode that node runs.

#[cfg(test)]
mod tests {
    use crate::harness::{config, miner, TestNode};
    use node_runtime::contracts::kv;
    use shared_types::{BlockAttachOperationStatus, Transaction};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const BLOCKS: u64 = 6;

    /// Body of the block at `height`. Every transaction is unique across
    /// heights; the second transfer always fails for lack of balance.
    fn body(height: u64) -> Vec<Transaction> {
        vec![
            kv::increment(miner(1), "alice", 10 * height),
            kv::increment(miner(2), "bob", height),
            kv::transfer(miner(1), "alice", "carol", 7 + height),
            kv::transfer(miner(2), "bob", "dave", 1_000_000 + height),
            kv::set(miner(3), &format!("note-{height}"), height.to_le_bytes().to_vec()),
        ]
    }

    async fn producer_with_chain() -> (TestNode, Vec<shared_types::Block>) {
        let producer = TestNode::new(config());
        producer.create_chain().await;
        let blocks = producer.mine_chain(BLOCKS, body).await;
        (producer, blocks)
    }

    // =============================================================================
    // INTEGRATION TESTS: REPLAY
    // =============================================================================

    #[tokio::test]
    async fn test_replay_reproduces_hashes_results_and_state() {
        let (producer, blocks) = producer_with_chain().await;

        let replica = TestNode::new(config());
        let genesis = replica.create_chain().await;
        assert_eq!(genesis.hash(), producer.chain().genesis_block_hash);

        for block in &blocks {
            let outcome = replica.deliver(&producer, block).await.unwrap();
            assert_eq!(outcome.status, BlockAttachOperationStatus::ExtendedLongestChain);
            assert!(outcome.best_chain_advanced());
        }

        assert_eq!(replica.chain().best_chain_hash, producer.chain().best_chain_hash);
        assert_eq!(replica.chain().best_chain_height, BLOCKS);

        for block in &blocks {
            let ours = replica.results(block).await;
            let theirs = producer.results(block).await;
            assert_eq!(ours, theirs);
            assert_eq!(
                bincode::serialize(&ours).unwrap(),
                bincode::serialize(&theirs).unwrap()
            );
            assert!(!ours[2].is_failed());
            assert!(ours[3].is_failed());
        }

        // alice gains 10h and pays 7 + h per height
        let tip = blocks.last().unwrap();
        assert_eq!(replica.counter(tip, "alice").await, 147);
        assert_eq!(replica.counter(tip, "carol").await, 63);
        assert_eq!(replica.counter(tip, "bob").await, 21);
        assert_eq!(replica.counter(tip, "dave").await, 0);
    }

    #[tokio::test]
    async fn test_sequential_replica_agrees_with_parallel_producer() {
        let (producer, blocks) = producer_with_chain().await;

        let mut sequential_config = config();
        sequential_config.execution.enable_parallel = false;
        let replica = TestNode::new(sequential_config);
        replica.create_chain().await;

        for block in &blocks {
            let outcome = replica.deliver(&producer, block).await.unwrap();
            assert!(outcome.best_chain_advanced());
            assert_eq!(replica.results(block).await, producer.results(block).await);
        }
        assert_eq!(replica.chain().best_chain_hash, producer.chain().best_chain_hash);
    }

    #[tokio::test]
    async fn test_redelivered_block_is_already_linked() {
        let (producer, blocks) = producer_with_chain().await;
        let replica = TestNode::new(config());
        replica.create_chain().await;
        for block in &blocks[..2] {
            replica.deliver(&producer, block).await.unwrap();
        }

        let outcome = replica.deliver(&producer, &blocks[1]).await.unwrap();

        assert_eq!(outcome.status, BlockAttachOperationStatus::AlreadyLinked);
        assert!(outcome.cycle.is_none());
        assert_eq!(replica.chain().best_chain_height, 2);
    }

    #[tokio::test]
    async fn test_tampered_state_root_is_rejected() {
        let (producer, blocks) = producer_with_chain().await;
        let replica = TestNode::new(config());
        replica.create_chain().await;

        // Declares a world state the body does not execute to
        let mut forged = blocks[0].clone();
        forged.header.merkle_tree_root_of_world_state = [0xee; 32];

        let outcome = replica.deliver(&producer, &forged).await.unwrap();

        assert!(!outcome.best_chain_advanced());
        assert_eq!(replica.chain().best_chain_height, 0);
        assert!(replica
            .services
            .chain_manager
            .get_link(&forged.hash())
            .unwrap()
            .is_failed());
    }
}
