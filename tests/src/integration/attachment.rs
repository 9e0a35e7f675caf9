//! # Block Attachment Across Nodes
//!
//! Fork choice, batch atomicity and failure handling of the attach cycle,
//! with blocks that really execute.
//!
//! ## Flows Tested:
//!
//! 1. **Unknown parent**: refused before anything is stored in the chain
//! 2. **Fork switch**: a longer branch replaces the executed one
//! 3. **Deferred then rejected**: nothing of the failed batch becomes best
//! 4. **Storage outage**: the batch aborts and the branch is rolled back

#[cfg(test)]
mod tests {
    use crate::harness::{config, miner, slot_miner, timestamp, TestNode, NOW};
    use kc_05_chain_manager::{AttachCycle, ChainError};
    use node_runtime::contracts::kv;
    use shared_bus::BlockchainEvent;
    use shared_types::{Block, BlockAttachOperationStatus, Transaction};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn main_body(height: u64) -> Vec<Transaction> {
        vec![kv::increment(miner(1), "main", height)]
    }

    /// Producer with `count` main-chain blocks.
    async fn producer_node(count: u64) -> (TestNode, Vec<Block>) {
        let node = TestNode::new(config());
        node.create_chain().await;
        let blocks = node.mine_chain(count, main_body).await;
        (node, blocks)
    }

    async fn deliver_all(to: &TestNode, from: &TestNode, blocks: &[Block]) {
        for block in blocks {
            let outcome = to.deliver(from, block).await.unwrap();
            assert!(outcome.best_chain_advanced());
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: STRUCTURAL CHECKS
    // =============================================================================

    #[tokio::test]
    async fn test_unknown_parent_leaves_chain_unchanged() {
        let (producer, blocks) = producer_node(3).await;
        let receiver = TestNode::new(config());
        receiver.create_chain().await;
        deliver_all(&receiver, &producer, &blocks[..1]).await;

        let before = receiver.chain();
        let links = receiver.services.chain_manager.link_count();

        let err = receiver.deliver(&producer, &blocks[2]).await.unwrap_err();

        assert!(matches!(err, ChainError::UnknownParent { .. }));
        assert!(err.is_structural());
        assert_eq!(receiver.chain(), before);
        assert_eq!(receiver.services.chain_manager.link_count(), links);
    }

    // =============================================================================
    // INTEGRATION TESTS: FORK CHOICE
    // =============================================================================

    #[tokio::test]
    async fn test_longer_fork_replaces_executed_chain() {
        let (main, main_blocks) = producer_node(10).await;

        // Second producer shares heights 1..=8 and forks from there
        let rival = TestNode::new(config());
        rival.create_chain().await;
        deliver_all(&rival, &main, &main_blocks[..8]).await;
        let mut fork = Vec::new();
        let mut tip = main_blocks[7].clone();
        for height in 9..=11 {
            tip = rival
                .mine(
                    &tip,
                    slot_miner(height + 1),
                    timestamp(height) + 500,
                    vec![kv::increment(miner(4), "fork", height)],
                )
                .await;
            fork.push(tip.clone());
        }

        let receiver = TestNode::new(config());
        receiver.create_chain().await;
        deliver_all(&receiver, &main, &main_blocks).await;

        for block in &fork[..2] {
            let outcome = receiver.deliver(&rival, block).await.unwrap();
            assert_eq!(outcome.status, BlockAttachOperationStatus::Forked);
            assert!(outcome.cycle.is_none());
        }
        assert_eq!(receiver.chain().best_chain_hash, main_blocks[9].hash());

        let outcome = receiver.deliver(&rival, &fork[2]).await.unwrap();

        assert_eq!(outcome.status, BlockAttachOperationStatus::ReplacedLongestChain);
        match outcome.cycle {
            Some(AttachCycle::BestChainAdvanced {
                block_hash,
                block_height,
                executed,
            }) => {
                assert_eq!(block_hash, fork[2].hash());
                assert_eq!(block_height, 11);
                let heights: Vec<u64> = executed.iter().map(|s| s.height()).collect();
                assert_eq!(heights, vec![9, 10, 11]);
            }
            other => panic!("expected the fork to become best, got {other:?}"),
        }

        let chain = receiver.chain();
        assert_eq!(chain.best_chain_hash, fork[2].hash());
        assert_eq!(chain.longest_chain_hash, fork[2].hash());
        assert_eq!(receiver.counter(&fork[2], "fork").await, 30);
        assert_eq!(receiver.counter(&fork[2], "main").await, 36);
        assert_eq!(receiver.counter(&main_blocks[9], "fork").await, 0);
    }

    // =============================================================================
    // INTEGRATION TESTS: BATCH ATOMICITY
    // =============================================================================

    /// Producer whose chain runs to 12, blocks 11 and 12 stamped ahead of
    /// the receivers' clocks.
    async fn producer_with_future_tip() -> (TestNode, Vec<Block>) {
        let producer = TestNode::new(config());
        producer.clock.set(NOW + 100_000);
        producer.create_chain().await;
        let mut blocks = producer.mine_chain(10, main_body).await;
        let mut tip = blocks[9].clone();
        for (height, stamp) in [(11, NOW + 10_000), (12, NOW + 11_000)] {
            tip = producer
                .mine(&tip, slot_miner(height), stamp, main_body(height))
                .await;
            blocks.push(tip.clone());
        }
        (producer, blocks)
    }

    #[tokio::test]
    async fn test_failed_block_discards_whole_batch() {
        let (producer, blocks) = producer_with_future_tip().await;
        let (receiver, fault) = TestNode::with_post_validation_fault(config());
        receiver.create_chain().await;
        deliver_all(&receiver, &producer, &blocks[..10]).await;
        let (b10, b11, b12) = (&blocks[9], &blocks[10], &blocks[11]);
        let mut events = receiver.events();

        // Block 11 is ahead of local time
        let outcome = receiver.deliver(&producer, b11).await.unwrap();
        assert_eq!(outcome.status, BlockAttachOperationStatus::ExtendedLongestChain);
        assert!(matches!(
            outcome.cycle,
            Some(AttachCycle::Deferred { block_hash, .. }) if block_hash == b11.hash()
        ));
        assert_eq!(receiver.chain().best_chain_hash, b10.hash());
        assert_eq!(receiver.chain().longest_chain_hash, b11.hash());

        // Once time has caught up, 11 executes but 12 fails validation
        fault.reject(b12);
        receiver.clock.set(NOW + 20_000);
        let outcome = receiver.deliver(&producer, b12).await.unwrap();

        match outcome.cycle {
            Some(AttachCycle::BranchDiscarded {
                block_hash,
                removed,
                ..
            }) => {
                assert_eq!(block_hash, b12.hash());
                assert_eq!(removed, vec![b11.hash()]);
            }
            other => panic!("expected the branch to be discarded, got {other:?}"),
        }

        let chain = receiver.chain();
        assert_eq!(chain.best_chain_hash, b10.hash());
        assert_eq!(chain.best_chain_height, 10);
        assert_eq!(chain.longest_chain_hash, b10.hash());

        let manager = &receiver.services.chain_manager;
        assert!(manager.get_link(&b11.hash()).is_none());
        assert!(manager.get_link(&b12.hash()).unwrap().is_failed());
        assert!(manager.get_not_executed_links(&b12.hash()).is_empty());

        let events = events.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            BlockchainEvent::BlockRejected { block_hash, block_height: 12, .. }
                if *block_hash == b12.hash()
        )));
        assert!(!events
            .iter()
            .any(|e| matches!(e, BlockchainEvent::BestChainFound { .. })));
    }

    #[tokio::test]
    async fn test_discarded_block_can_return_but_failed_one_cannot_be_extended() {
        let (producer, mut blocks) = producer_with_future_tip().await;
        let b13 = producer
            .mine(&blocks[11], slot_miner(13), NOW + 12_000, main_body(13))
            .await;
        blocks.push(b13);

        let (receiver, fault) = TestNode::with_post_validation_fault(config());
        receiver.create_chain().await;
        receiver.clock.set(NOW + 20_000);
        deliver_all(&receiver, &producer, &blocks[..10]).await;
        fault.reject(&blocks[11]);
        receiver.deliver(&producer, &blocks[10]).await.unwrap();

        // 11 executed on its own and stays best
        assert_eq!(receiver.chain().best_chain_hash, blocks[10].hash());

        let outcome = receiver.deliver(&producer, &blocks[11]).await.unwrap();
        assert!(matches!(
            outcome.cycle,
            Some(AttachCycle::BranchDiscarded { .. })
        ));
        assert_eq!(receiver.chain().best_chain_hash, blocks[10].hash());
        assert_eq!(receiver.chain().longest_chain_hash, blocks[10].hash());

        let err = receiver.deliver(&producer, &blocks[12]).await.unwrap_err();
        assert!(matches!(err, ChainError::ParentExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_block_rolled_back_with_its_batch_is_accepted_again() {
        let (producer, blocks) = producer_with_future_tip().await;
        let (receiver, fault) = TestNode::with_post_validation_fault(config());
        receiver.create_chain().await;
        receiver.clock.set(NOW + 20_000);
        deliver_all(&receiver, &producer, &blocks[..10]).await;

        // 11 and 12 arrive as one batch: 12 is bad, 11 goes with it
        let (b11, b12) = (&blocks[10], &blocks[11]);
        fault.reject(b12);
        receiver.clock.set(NOW);
        receiver.deliver(&producer, b11).await.unwrap();
        receiver.clock.set(NOW + 20_000);
        receiver.deliver(&producer, b12).await.unwrap();
        assert!(receiver.services.chain_manager.get_link(&b11.hash()).is_none());

        // 11 alone is fine; its state was already committed
        let outcome = receiver.deliver(&producer, b11).await.unwrap();

        assert!(outcome.best_chain_advanced());
        assert_eq!(receiver.chain().best_chain_hash, b11.hash());
        assert_eq!(receiver.counter(b11, "main").await, 66);
    }

    // =============================================================================
    // INTEGRATION TESTS: INFRASTRUCTURE FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_state_store_outage_aborts_and_recovers() {
        let (producer, blocks) = producer_node(4).await;
        let receiver = TestNode::new(config());
        receiver.create_chain().await;
        deliver_all(&receiver, &producer, &blocks[..3]).await;

        receiver.services.state_store.set_available(false);
        let err = receiver.deliver(&producer, &blocks[3]).await.unwrap_err();

        assert!(matches!(err, ChainError::Aborted { .. }));
        let chain = receiver.chain();
        assert_eq!(chain.best_chain_hash, blocks[2].hash());
        assert_eq!(chain.longest_chain_hash, blocks[2].hash());
        assert!(receiver
            .services
            .chain_manager
            .get_link(&blocks[3].hash())
            .is_none());

        receiver.services.state_store.set_available(true);
        let outcome = receiver.deliver(&producer, &blocks[3]).await.unwrap();
        assert!(outcome.best_chain_advanced());
        assert_eq!(receiver.chain().best_chain_height, 4);
    }
}
