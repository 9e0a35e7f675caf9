use crate::ports::{BlockchainStore, TransactionResultStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    short_hex, Block, Chain, Hash, StorageError, Transaction, TransactionResult,
};
use std::collections::HashMap;
use tracing::debug;

/// In-memory implementation of BlockchainStore
pub struct InMemoryBlockchainStore {
    chain_id: u32,
    blocks: RwLock<HashMap<Hash, Block>>,
    transactions: RwLock<HashMap<Hash, Transaction>>,
    chain: RwLock<Option<Chain>>,
}

impl InMemoryBlockchainStore {
    pub fn new(chain_id: u32) -> Self {
        Self {
            chain_id,
            blocks: RwLock::new(HashMap::new()),
            transactions: RwLock::new(HashMap::new()),
            chain: RwLock::new(None),
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.read().len()
    }
}

impl Default for InMemoryBlockchainStore {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl BlockchainStore for InMemoryBlockchainStore {
    async fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError> {
        Ok(self.blocks.read().get(hash).cloned())
    }

    async fn add_block(&self, block: Block) -> Result<(), StorageError> {
        self.blocks.write().insert(block.hash(), block);
        Ok(())
    }

    async fn add_transactions(&self, transactions: Vec<Transaction>) -> Result<(), StorageError> {
        let mut store = self.transactions.write();
        for tx in transactions {
            store.insert(tx.hash(), tx);
        }
        Ok(())
    }

    async fn get_transactions(&self, ids: &[Hash]) -> Result<Vec<Transaction>, StorageError> {
        let store = self.transactions.read();
        ids.iter()
            .map(|id| {
                store
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StorageError::NotFound(format!("transaction {}", hex::encode(id))))
            })
            .collect()
    }

    async fn create_chain(&self, genesis: Block, transactions: Vec<Transaction>) -> Result<Chain, StorageError> {
        let genesis_hash = genesis.hash();
        let mut chain = self.chain.write();
        if let Some(existing) = chain.as_ref() {
            return Err(StorageError::ChainAlreadyCreated(hex::encode(
                existing.genesis_block_hash,
            )));
        }

        let created = Chain::new(self.chain_id, genesis_hash, genesis.height());
        self.blocks.write().insert(genesis_hash, genesis);
        {
            let mut store = self.transactions.write();
            for tx in transactions {
                store.insert(tx.hash(), tx);
            }
        }
        *chain = Some(created.clone());

        debug!(genesis = %short_hex(&genesis_hash), "Chain record created");
        Ok(created)
    }

    async fn set_best_chain(&self, height: u64, hash: Hash) -> Result<(), StorageError> {
        let mut guard = self.chain.write();
        let chain = guard.as_mut().ok_or(StorageError::ChainNotCreated)?;
        chain.best_chain_height = height;
        chain.best_chain_hash = hash;
        if height > chain.longest_chain_height {
            chain.longest_chain_height = height;
            chain.longest_chain_hash = hash;
        }
        Ok(())
    }

    async fn get_chain(&self) -> Result<Option<Chain>, StorageError> {
        Ok(self.chain.read().clone())
    }
}

/// In-memory implementation of TransactionResultStore
#[derive(Default)]
pub struct InMemoryTransactionResultStore {
    results: RwLock<HashMap<(Hash, Hash), TransactionResult>>,
}

impl InMemoryTransactionResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl TransactionResultStore for InMemoryTransactionResultStore {
    async fn add_transaction_result(&self, result: TransactionResult) -> Result<(), StorageError> {
        let key = (result.transaction_id, result.block_hash);
        let mut results = self.results.write();
        match results.get(&key) {
            Some(existing) if *existing == result => Ok(()),
            Some(_) => Err(StorageError::ResultConflict {
                tx: hex::encode(key.0),
                block: hex::encode(key.1),
            }),
            None => {
                results.insert(key, result);
                Ok(())
            }
        }
    }

    async fn get_transaction_result(
        &self,
        transaction_id: &Hash,
        block_hash: &Hash,
    ) -> Result<Option<TransactionResult>, StorageError> {
        Ok(self
            .results
            .read()
            .get(&(*transaction_id, *block_hash))
            .cloned())
    }
}
