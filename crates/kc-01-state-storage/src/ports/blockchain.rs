use async_trait::async_trait;
use shared_types::{Block, Chain, Hash, StorageError, Transaction, TransactionResult};

/// Blocks, transactions and the persisted chain record.
#[async_trait]
pub trait BlockchainStore: Send + Sync {
    async fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError>;

    async fn add_block(&self, block: Block) -> Result<(), StorageError>;

    async fn add_transactions(&self, transactions: Vec<Transaction>) -> Result<(), StorageError>;

    /// Transactions in the order of `ids`. A missing id is `NotFound`.
    async fn get_transactions(&self, ids: &[Hash]) -> Result<Vec<Transaction>, StorageError>;

    /// Persist the genesis block and its transactions and create the chain
    /// record rooted at it.
    async fn create_chain(&self, genesis: Block, transactions: Vec<Transaction>) -> Result<Chain, StorageError>;

    async fn set_best_chain(&self, height: u64, hash: Hash) -> Result<(), StorageError>;

    async fn get_chain(&self) -> Result<Option<Chain>, StorageError>;
}

/// Transaction results keyed by `(transaction id, block hash)`.
#[async_trait]
pub trait TransactionResultStore: Send + Sync {
    /// Insert a result. Rewriting an identical result is a no-op; a
    /// different result for the same pair is `ResultConflict`.
    async fn add_transaction_result(&self, result: TransactionResult) -> Result<(), StorageError>;

    async fn get_transaction_result(
        &self,
        transaction_id: &Hash,
        block_hash: &Hash,
    ) -> Result<Option<TransactionResult>, StorageError>;
}
