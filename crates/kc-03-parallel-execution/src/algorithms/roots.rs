//! Header commitments over an executed batch

use kc_01_state_storage::StateDelta;
use rayon::prelude::*;
use sha3::{Digest, Keccak256};
use shared_types::{merkle_root, BlockHeader, Bloom, Hash, TransactionResult};

/// Merkle root of the transaction ids in block order.
pub fn transactions_root(transaction_ids: &[Hash]) -> Hash {
    merkle_root(transaction_ids.to_vec())
}

fn status_leaf(result: &TransactionResult) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(result.transaction_id);
    hasher.update([result.status.as_byte()]);
    hasher.finalize().into()
}

/// Merkle root over `(transaction id, status)` pairs.
///
/// Leaves are hashed on the rayon pool once the batch reaches
/// `parallel_threshold`.
pub fn transaction_status_root(results: &[TransactionResult], parallel_threshold: usize) -> Hash {
    let leaves: Vec<Hash> = if results.len() >= parallel_threshold {
        results.par_iter().map(status_leaf).collect()
    } else {
        results.iter().map(status_leaf).collect()
    };
    merkle_root(leaves)
}

/// Root of the merged delta chained onto the parent block.
pub fn world_state_root(delta: &StateDelta, previous_block_hash: &Hash) -> Hash {
    delta.root(previous_block_hash)
}

/// Union of every result bloom.
pub fn block_bloom(results: &[TransactionResult]) -> Bloom {
    Bloom::combine(results.iter().map(|r| &r.bloom))
}

/// Copy of `header` carrying the commitments of this execution.
pub fn stamp_header(
    header: &BlockHeader,
    transaction_ids: &[Hash],
    results: &[TransactionResult],
    delta: &StateDelta,
    parallel_threshold: usize,
) -> BlockHeader {
    BlockHeader {
        merkle_tree_root_of_transactions: transactions_root(transaction_ids),
        merkle_tree_root_of_world_state: world_state_root(delta, &header.previous_block_hash),
        merkle_tree_root_of_transaction_status: transaction_status_root(results, parallel_threshold),
        bloom: block_bloom(results).as_bytes().to_vec(),
        ..header.clone()
    }
}
