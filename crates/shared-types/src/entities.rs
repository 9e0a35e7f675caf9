//! # Core Domain Entities
//!
//! Blocks, transactions and transaction results.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `BlockHeader`, `BlockBody`, `Transaction`
//! - **Execution**: `TransactionResult`, `LogEvent`, `TransactionResultStatus`
//! - **State**: `StateKey`

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::bloom::Bloom;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte address identifying an account or a contract.
pub type Address = [u8; 20];

/// Previous-block hash carried by the genesis block.
pub const EMPTY_HASH: Hash = [0u8; 32];

/// Height of the genesis block.
pub const GENESIS_HEIGHT: u64 = 0;

/// Short hex form of a hash for log fields.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..6])
}

/// The header of a block containing metadata and the execution commitments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u32,
    /// Chain the block belongs to.
    pub chain_id: u32,
    /// Block height in the chain.
    pub height: u64,
    /// Hash of the parent block (creates the chain linkage).
    pub previous_block_hash: Hash,
    /// Production time in unix milliseconds.
    pub timestamp: u64,
    /// The miner that produced this block.
    pub producer: Address,
    /// Merkle root of the block's transaction ids.
    pub merkle_tree_root_of_transactions: Hash,
    /// Root of the state delta produced by executing the block.
    pub merkle_tree_root_of_world_state: Hash,
    /// Merkle root over `(transaction id, result status)` pairs.
    pub merkle_tree_root_of_transaction_status: Hash,
    /// Union of the blooms of every transaction result.
    pub bloom: Vec<u8>,
}

impl BlockHeader {
    /// Compute the hash of this block header.
    ///
    /// Always recomputed from the fields; there is no cached copy.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.chain_id.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.previous_block_hash);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.producer);
        hasher.update(self.merkle_tree_root_of_transactions);
        hasher.update(self.merkle_tree_root_of_world_state);
        hasher.update(self.merkle_tree_root_of_transaction_status);
        hasher.update((self.bloom.len() as u64).to_le_bytes());
        hasher.update(&self.bloom);
        hasher.finalize().into()
    }

    /// Check if this is a genesis header.
    pub fn is_genesis(&self) -> bool {
        self.height == GENESIS_HEIGHT && self.previous_block_hash == EMPTY_HASH
    }
}

/// Ordered transaction ids of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockBody {
    pub transaction_ids: Vec<Hash>,
}

/// A block. Never mutated once built; identity is the header hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, transaction_ids: Vec<Hash>) -> Self {
        Self {
            header,
            body: BlockBody { transaction_ids },
        }
    }

    /// Get the hash of this block
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn previous_block_hash(&self) -> Hash {
        self.header.previous_block_hash
    }

    pub fn transaction_ids(&self) -> &[Hash] {
        &self.body.transaction_ids
    }
}

/// A transaction addressed to a contract method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub from: Address,
    /// Contract address being called.
    pub to: Address,
    /// Height of the block the sender referenced when signing.
    pub ref_block_number: u64,
    /// Contract method to invoke.
    pub method_name: String,
    /// Encoded method parameters.
    pub params: Vec<u8>,
    /// Sender's signature over the unsigned fields.
    pub signature: Vec<u8>,
}

impl Transaction {
    pub fn new(from: Address, to: Address, method_name: impl Into<String>, params: Vec<u8>) -> Self {
        Self {
            from,
            to,
            ref_block_number: 0,
            method_name: method_name.into(),
            params,
            signature: Vec::new(),
        }
    }

    pub fn with_ref_block_number(mut self, height: u64) -> Self {
        self.ref_block_number = height;
        self
    }

    /// Compute the transaction id (signature excluded).
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.from);
        hasher.update(self.to);
        hasher.update(self.ref_block_number.to_le_bytes());
        hasher.update((self.method_name.len() as u64).to_le_bytes());
        hasher.update(self.method_name.as_bytes());
        hasher.update((self.params.len() as u64).to_le_bytes());
        hasher.update(&self.params);
        hasher.finalize().into()
    }
}

// =============================================================================
// CLUSTER B: EXECUTION RESULTS
// =============================================================================

/// Outcome of a transaction as recorded in its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransactionResultStatus {
    #[default]
    NotExisted,
    Pending,
    Failed,
    Mined,
    Conflict,
    PendingValidation,
    NodeValidationFailed,
}

impl TransactionResultStatus {
    /// Stable byte used when committing the status into a merkle root.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::NotExisted => 0,
            Self::Pending => 1,
            Self::Failed => 2,
            Self::Mined => 3,
            Self::Conflict => 4,
            Self::PendingValidation => 5,
            Self::NodeValidationFailed => 6,
        }
    }
}

/// An event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Emitting contract.
    pub address: Address,
    /// Event name.
    pub name: String,
    pub indexed: Vec<Vec<u8>>,
    pub non_indexed: Vec<u8>,
}

impl LogEvent {
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            indexed: Vec::new(),
            non_indexed: Vec::new(),
        }
    }

    pub fn with_non_indexed(mut self, data: Vec<u8>) -> Self {
        self.non_indexed = data;
        self
    }

    /// Bloom over the emitting address and the event name.
    pub fn bloom(&self) -> Bloom {
        let mut bloom = Bloom::default();
        bloom.add_value(&self.address);
        bloom.add_value(self.name.as_bytes());
        for topic in &self.indexed {
            bloom.add_value(topic);
        }
        bloom
    }
}

/// Result of one transaction executed inside one block.
///
/// Written once per `(transaction_id, block_hash)`; a fork that re-executes
/// the transaction writes a new entry under the new block hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: Hash,
    pub block_hash: Hash,
    pub block_number: u64,
    pub status: TransactionResultStatus,
    pub return_value: Vec<u8>,
    pub logs: Vec<LogEvent>,
    pub bloom: Bloom,
    /// Contract fault message when `status` is `Failed`.
    pub error: Option<String>,
}

impl TransactionResult {
    /// Hash committing to the status and outputs of this result.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.transaction_id);
        hasher.update([self.status.as_byte()]);
        hasher.update((self.return_value.len() as u64).to_le_bytes());
        hasher.update(&self.return_value);
        hasher.update(self.bloom.as_bytes());
        hasher.finalize().into()
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransactionResultStatus::Failed
    }
}

// =============================================================================
// CLUSTER C: STATE
// =============================================================================

/// Key of a state entry, scoped to the contract that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub address: Address,
    pub path: String,
}

impl StateKey {
    pub fn new(address: Address, path: impl Into<String>) -> Self {
        Self {
            address,
            path: path.into(),
        }
    }

    /// Bytes hashed when committing a delta.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(20 + 8 + self.path.len());
        out.extend_from_slice(&self.address);
        out.extend_from_slice(&(self.path.len() as u64).to_le_bytes());
        out.extend_from_slice(self.path.as_bytes());
        out
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", hex::encode(&self.address[..4]), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(height: u64) -> BlockHeader {
        BlockHeader {
            height,
            previous_block_hash: [1u8; 32],
            timestamp: 1_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_header_hash_is_content_addressed() {
        let a = header(5);
        let mut b = header(5);
        assert_eq!(a.hash(), b.hash());

        b.merkle_tree_root_of_world_state = [9u8; 32];
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_genesis_detection() {
        let genesis = BlockHeader::default();
        assert!(genesis.is_genesis());
        assert!(!header(0).is_genesis());
        assert!(!header(1).is_genesis());
    }

    #[test]
    fn test_transaction_hash_ignores_signature() {
        let tx = Transaction::new([1u8; 20], [2u8; 20], "Transfer", vec![1, 2, 3]);
        let mut signed = tx.clone();
        signed.signature = vec![7u8; 65];
        assert_eq!(tx.hash(), signed.hash());

        let other = tx.clone().with_ref_block_number(3);
        assert_ne!(tx.hash(), other.hash());
    }

    #[test]
    fn test_state_key_ordering_is_by_address_then_path() {
        let a = StateKey::new([1u8; 20], "z");
        let b = StateKey::new([2u8; 20], "a");
        let c = StateKey::new([1u8; 20], "a");
        let mut keys = vec![a.clone(), b.clone(), c.clone()];
        keys.sort();
        assert_eq!(keys, vec![c, a, b]);
    }

    #[test]
    fn test_result_hash_covers_status() {
        let mut result = TransactionResult {
            transaction_id: [3u8; 32],
            block_hash: [4u8; 32],
            block_number: 1,
            status: TransactionResultStatus::Mined,
            return_value: vec![],
            logs: vec![],
            bloom: Bloom::default(),
            error: None,
        };
        let mined = result.hash();
        result.status = TransactionResultStatus::Failed;
        assert_ne!(mined, result.hash());
    }

    #[test]
    fn test_header_serde_roundtrip() {
        let h = header(7);
        let json = serde_json::to_string(&h).unwrap();
        let back: BlockHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(h.hash(), back.hash());
    }
}
