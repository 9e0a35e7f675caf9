//! # Merkle Tree
//!
//! Binary Keccak-256 tree used for the transaction and status roots of a
//! block header.
//!
//! Leaves are padded to the next power of two with `EMPTY_HASH`; a single
//! leaf is padded to two. An empty leaf set has root `EMPTY_HASH`.

use sha3::{Digest, Keccak256};

use crate::entities::{Hash, EMPTY_HASH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// Tree in array form: root at index 0, leaves at the end.
    nodes: Vec<Hash>,
    leaf_count: usize,
}

impl MerkleTree {
    pub fn build(leaves: Vec<Hash>) -> Self {
        let leaf_count = leaves.len();
        if leaf_count == 0 {
            return Self {
                nodes: vec![EMPTY_HASH],
                leaf_count: 0,
            };
        }

        let padded = if leaf_count == 1 {
            2
        } else {
            leaf_count.next_power_of_two()
        };
        let mut nodes = vec![EMPTY_HASH; 2 * padded - 1];
        let leaf_start = padded - 1;
        for (i, leaf) in leaves.into_iter().enumerate() {
            nodes[leaf_start + i] = leaf;
        }
        for i in (0..leaf_start).rev() {
            nodes[i] = Self::hash_pair(&nodes[2 * i + 1], &nodes[2 * i + 2]);
        }

        Self { nodes, leaf_count }
    }

    pub fn root(&self) -> Hash {
        self.nodes[0]
    }

    /// Number of leaves before padding.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }
}

/// Root over an ordered leaf list.
pub fn merkle_root(leaves: Vec<Hash>) -> Hash {
    MerkleTree::build(leaves).root()
}
