//! # Kernel Chain Execution Benchmarks
//!
//! | Benchmark | What it measures |
//! |-----------|------------------|
//! | `batch/parallel` | One block of independent key/value writes, grouped schedule |
//! | `batch/sequential` | Same block, block order |
//! | `batch/contended` | Every transaction on one key, falls back to block order |
//! | `attach/replay` | Full pipeline per block on a replica node |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kc_01_state_storage::StateVersion;
use kc_03_parallel_execution::ParallelExecutionApi;
use kc_tests::harness::{config, miner, slot_miner, timestamp, TestNode};
use kc_tests::integration::execution::coordinator;
use node_runtime::contracts::kv;
use shared_types::{Block, BlockHeader, Transaction};
use std::time::Duration;
use tokio::runtime::Runtime;

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

fn independent_batch(size: usize) -> Vec<Transaction> {
    (0..size)
        .map(|i| kv::increment(miner((i % 250) as u8), &format!("key-{i}"), i as u64 + 1))
        .collect()
}

fn contended_batch(size: usize) -> Vec<Transaction> {
    (0..size)
        .map(|i| kv::increment(miner((i % 250) as u8), "hot", i as u64 + 1))
        .collect()
}

// ============================================================================
// Batch execution: parallel schedule vs block order
// ============================================================================

fn bench_batch_execution(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let node = TestNode::new(config());
    let genesis = runtime.block_on(node.create_chain());
    let parent = StateVersion::of_block(genesis.hash());
    let header = header(&genesis);

    let parallel = coordinator(&node, true);
    let sequential = coordinator(&node, false);

    let mut group = c.benchmark_group("batch");
    group.measurement_time(Duration::from_secs(5));

    for size in [16usize, 64, 256] {
        let independent = independent_batch(size);
        let contended = contended_batch(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("parallel", size), &independent, |b, txs| {
            b.iter(|| {
                runtime
                    .block_on(parallel.execute_batch(&header, black_box(txs), parent))
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("sequential", size), &independent, |b, txs| {
            b.iter(|| {
                runtime
                    .block_on(sequential.execute_batch(&header, black_box(txs), parent))
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("contended", size), &contended, |b, txs| {
            b.iter(|| {
                runtime
                    .block_on(parallel.execute_batch(&header, black_box(txs), parent))
                    .unwrap()
            })
        });
    }
    group.finish();
}

// ============================================================================
// Attachment: validation, execution and commit of a produced chain
// ============================================================================

fn bench_attach_replay(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let producer = TestNode::new(config());
    let blocks = runtime.block_on(async {
        producer.create_chain().await;
        producer
            .mine_chain(20, |height| {
                (0..32)
                    .map(|i| kv::increment(miner(i as u8), &format!("acct-{i}"), height))
                    .collect()
            })
            .await
    });

    let mut group = c.benchmark_group("attach");
    group.sample_size(10);
    group.throughput(Throughput::Elements(blocks.len() as u64));
    group.bench_function("replay", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let replica = TestNode::new(config());
                replica.create_chain().await;
                for block in &blocks {
                    replica.deliver(&producer, block).await.unwrap();
                }
                black_box(replica.chain().best_chain_height)
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench_batch_execution, bench_attach_replay);
criterion_main!(benches);
