//! # Genesis and Consensus Rounds
//!
//! The consensus schedule lives in contract state: genesis writes round 1,
//! blocks move it on, and producer checks read it at the parent block.

#[cfg(test)]
mod tests {
    use crate::harness::{config, miner, timestamp, TestNode, MINING_INTERVAL_MS, NOW};
    use kc_02_consensus_rounds::ConsensusError;
    use kc_04_block_execution::BlockProcessingStage;
    use kc_05_chain_manager::AttachCycle;
    use node_runtime::contracts::{consensus, kv};
    use node_runtime::GenesisBuilder;

    // =============================================================================
    // INTEGRATION TESTS: GENESIS
    // =============================================================================

    #[tokio::test]
    async fn test_genesis_commits_round_and_seed_state() {
        let node = TestNode::new(config());
        let transactions = GenesisBuilder::from_config(&node.config)
            .with_seed_transaction(kv::increment(miner(1), "supply", 100))
            .with_seed_transaction(kv::set(miner(2), "name", b"kernel".to_vec()))
            .build()
            .unwrap();
        assert_eq!(transactions.len(), 3);

        let genesis = node.create_chain_with(transactions).await;

        assert_eq!(genesis.height(), 0);
        assert_eq!(genesis.header.timestamp, 0);
        let chain = node.chain();
        assert_eq!(chain.best_chain_height, 0);
        assert_eq!(chain.best_chain_hash, genesis.hash());
        assert!(node
            .services
            .chain_manager
            .get_link(&genesis.hash())
            .unwrap()
            .is_executed());

        let results = node.results(&genesis).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.is_failed()));
        assert_eq!(node.counter(&genesis, "supply").await, 100);
        assert_eq!(node.services.scheduler.current_round_number().await, 1);
    }

    #[tokio::test]
    async fn test_every_node_derives_the_same_genesis() {
        let a = TestNode::new(config());
        let b = TestNode::new(config());
        assert_eq!(a.create_chain().await.hash(), b.create_chain().await.hash());
    }

    // =============================================================================
    // INTEGRATION TESTS: SCHEDULE
    // =============================================================================

    #[tokio::test]
    async fn test_first_round_schedule() {
        let node = TestNode::new(config());
        node.create_chain().await;
        let scheduler = &node.services.scheduler;

        let mut times = Vec::new();
        for b in 1..=3 {
            times.push(scheduler.expected_mining_time(&miner(b)).await.unwrap());
        }
        assert_eq!(times, vec![4_000, 8_000, 12_000]);

        let err = scheduler.miner_info(&miner(9)).await.unwrap_err();
        assert!(matches!(err, ConsensusError::UnknownMiner(_)));
        assert_eq!(scheduler.current_miners().await.len(), 3);
    }

    #[tokio::test]
    async fn test_distance_to_time_slot_changes_sign() {
        let node = TestNode::new(config());
        let scheduler = &node.services.scheduler;

        // No chain yet: the default slot at the epoch
        assert_eq!(scheduler.distance_to_time_slot(&miner(1)).await, -(NOW as i64));

        node.create_chain().await;
        node.clock.set(10_000);
        assert_eq!(scheduler.distance_to_time_slot(&miner(3)).await, 2_000);
        assert_eq!(scheduler.current_miner().await, Some(miner(2)));

        node.clock.set(20_000);
        assert_eq!(scheduler.distance_to_time_slot(&miner(3)).await, -8_000);
        assert_eq!(scheduler.current_miner().await, None);
    }

    // =============================================================================
    // INTEGRATION TESTS: ROUNDS THROUGH BLOCKS
    // =============================================================================

    #[tokio::test]
    async fn test_blocks_drive_the_round_forward() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;
        let contract = node.config.consensus.consensus_contract;
        let scheduler = &node.services.scheduler;

        let b1 = node
            .mine(
                &genesis,
                miner(1),
                timestamp(1),
                vec![consensus::update_value(contract, miner(1), 1)],
            )
            .await;
        let round = scheduler.current_round().await.unwrap();
        assert_eq!(round.miners[&miner(1)].actual_mining_time, Some(timestamp(1)));
        assert_eq!(round.miners[&miner(1)].produced_blocks, 1);

        let next = round.next_round(MINING_INTERVAL_MS);
        let b2 = node
            .mine(
                &b1,
                miner(2),
                timestamp(2),
                vec![consensus::next_round(contract, miner(2), &next)],
            )
            .await;

        assert_eq!(scheduler.current_round_number().await, 2);
        let round = scheduler.current_round().await.unwrap();
        assert_eq!(round.miners[&miner(1)].missed_time_slots, 0);
        assert_eq!(round.miners[&miner(2)].missed_time_slots, 1);
        assert_eq!(scheduler.expected_mining_time(&miner(1)).await.unwrap(), 16_000);
        assert_eq!(scheduler.expected_mining_time(&miner(3)).await.unwrap(), 24_000);

        // Skipping a round number reverts, the schedule stays
        let mut skipped = round.next_round(MINING_INTERVAL_MS);
        skipped.round_number = 5;
        let b3 = node
            .mine(
                &b2,
                miner(3),
                timestamp(3),
                vec![consensus::next_round(contract, miner(3), &skipped)],
            )
            .await;
        assert!(node.results(&b3).await[0].is_failed());
        assert_eq!(scheduler.current_round_number().await, 2);
    }

    #[tokio::test]
    async fn test_block_from_outside_the_round_is_rejected() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;

        let block = node
            .build_block(&genesis, miner(9), timestamp(1), vec![])
            .await;
        let outcome = node.attach(block.clone()).await.unwrap();

        match outcome.cycle {
            Some(AttachCycle::BranchDiscarded { reason, .. }) => {
                assert_eq!(reason.stage, BlockProcessingStage::ValidatingPre);
                assert!(!reason.retry_later);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(node.chain().best_chain_height, 0);
    }

    #[tokio::test]
    async fn test_block_before_producer_slot_is_rejected() {
        let node = TestNode::new(config());
        let genesis = node.create_chain().await;

        // miner 3's slot opens at 12s
        let block = node.build_block(&genesis, miner(3), 10_000, vec![]).await;
        let outcome = node.attach(block).await.unwrap();

        assert!(matches!(
            outcome.cycle,
            Some(AttachCycle::BranchDiscarded { .. })
        ));
        assert_eq!(node.chain().best_chain_height, 0);
    }
}
