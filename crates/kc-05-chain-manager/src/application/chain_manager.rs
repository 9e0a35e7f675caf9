//! Chain Manager
//!
//! Owns the link arena and the single `Chain` record. Readers never see a
//! half-applied mutation: every change runs under one write lock, and no
//! lock is held across an await.

use crate::domain::{ChainError, ChainResult, LinkIndex};
use kc_01_state_storage::{BlockchainStore, StateVersion};
use kc_02_consensus_rounds::CurrentStateVersion;
use parking_lot::RwLock;
use shared_types::{
    short_hex, Block, BlockAttachOperationStatus, Chain, ChainBlockLink,
    ChainBlockLinkExecutionStatus, Hash, Transaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ChainManager {
    blockchain_store: Arc<dyn BlockchainStore>,
    index: RwLock<Option<LinkIndex>>,
}

impl ChainManager {
    pub fn new(blockchain_store: Arc<dyn BlockchainStore>) -> Self {
        Self {
            blockchain_store,
            index: RwLock::new(None),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&LinkIndex) -> ChainResult<T>) -> ChainResult<T> {
        let guard = self.index.read();
        let index = guard.as_ref().ok_or(ChainError::ChainNotCreated)?;
        f(index)
    }

    fn write<T>(&self, f: impl FnOnce(&mut LinkIndex) -> ChainResult<T>) -> ChainResult<T> {
        let mut guard = self.index.write();
        let index = guard.as_mut().ok_or(ChainError::ChainNotCreated)?;
        f(index)
    }

    // === CHAIN ===

    /// Persist `genesis` and root the chain at it. Genesis must already be
    /// executed.
    pub async fn create_chain(&self, genesis: Block, transactions: Vec<Transaction>) -> ChainResult<Chain> {
        let created = self.index.read().is_some();
        if created {
            return Err(ChainError::ChainAlreadyCreated);
        }

        let link = ChainBlockLink::for_block(&genesis);
        let chain = self.blockchain_store.create_chain(genesis, transactions).await?;

        let mut guard = self.index.write();
        if guard.is_some() {
            return Err(ChainError::ChainAlreadyCreated);
        }
        *guard = Some(LinkIndex::new(chain.clone(), link));

        info!(
            genesis = %short_hex(&chain.genesis_block_hash),
            chain_id = chain.id,
            "Chain created"
        );
        Ok(chain)
    }

    pub fn get_chain(&self) -> Option<Chain> {
        self.index.read().as_ref().map(|index| index.chain().clone())
    }

    pub fn get_link(&self, hash: &Hash) -> Option<ChainBlockLink> {
        self.index
            .read()
            .as_ref()
            .and_then(|index| index.link(hash).cloned())
    }

    pub fn link_count(&self) -> usize {
        self.index.read().as_ref().map_or(0, LinkIndex::len)
    }

    // === LINKS ===

    pub fn record_block(&self, link: ChainBlockLink) -> ChainResult<BlockAttachOperationStatus> {
        let hash = link.block_hash;
        let height = link.height;
        let status = self.write(|index| index.record(link))?;
        debug!(
            block_hash = %short_hex(&hash),
            block_height = height,
            ?status,
            "Block link recorded"
        );
        Ok(status)
    }

    /// Unexecuted links up to `from`, ascending; empty without a chain.
    pub fn get_not_executed_links(&self, from: &Hash) -> Vec<ChainBlockLink> {
        self.index
            .read()
            .as_ref()
            .map(|index| index.not_executed_links(from))
            .unwrap_or_default()
    }

    pub fn set_link_execution_status(
        &self,
        hash: &Hash,
        status: ChainBlockLinkExecutionStatus,
    ) -> ChainResult<()> {
        self.set_link_execution_statuses(std::slice::from_ref(hash), status)
    }

    /// All-or-nothing status update under one write lock.
    pub fn set_link_execution_statuses(
        &self,
        hashes: &[Hash],
        status: ChainBlockLinkExecutionStatus,
    ) -> ChainResult<()> {
        self.write(|index| index.set_execution_statuses(hashes, status))?;
        debug!(count = hashes.len(), ?status, "Link execution status updated");
        Ok(())
    }

    // === POINTERS ===

    /// Advance the best chain to `(height, hash)` and persist it.
    pub async fn set_best_chain(&self, height: u64, hash: Hash) -> ChainResult<()> {
        self.read(|index| index.check_advance(height, &hash))?;
        self.blockchain_store.set_best_chain(height, hash).await?;
        self.write(|index| {
            index.check_advance(height, &hash)?;
            index.advance_best(height, hash);
            Ok(())
        })?;

        info!(block_hash = %short_hex(&hash), block_height = height, "Best chain advanced");
        Ok(())
    }

    /// Mark `hashes` executed and advance the best chain to `(height, hash)`.
    ///
    /// The pointer is persisted first; if the store refuses it the links
    /// stay unexecuted and the chain is unchanged.
    pub async fn commit_executed(&self, hashes: &[Hash], height: u64, hash: Hash) -> ChainResult<()> {
        self.read(|index| {
            index.check_transitions(hashes, ChainBlockLinkExecutionStatus::ExecutionSuccess)
        })?;
        self.blockchain_store.set_best_chain(height, hash).await?;
        self.write(|index| index.commit_executed(hashes, height, hash))?;

        info!(
            block_hash = %short_hex(&hash),
            block_height = height,
            count = hashes.len(),
            "Best chain advanced"
        );
        Ok(())
    }

    /// Roll the longest chain back to the best chain. Returns removed hashes.
    pub fn remove_longest_branch(&self) -> ChainResult<Vec<Hash>> {
        let removed = self.write(|index| Ok(index.remove_longest_branch()))?;
        warn!(removed = removed.len(), "Longest branch removed");
        Ok(removed)
    }
}

impl CurrentStateVersion for ChainManager {
    fn current_state_version(&self) -> StateVersion {
        self.index
            .read()
            .as_ref()
            .map_or(StateVersion::EMPTY, |index| {
                StateVersion::of_block(index.chain().best_chain_hash)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kc_01_state_storage::InMemoryBlockchainStore;
    use shared_types::BlockHeader;

    fn genesis() -> Block {
        Block::new(
            BlockHeader {
                chain_id: 1,
                ..Default::default()
            },
            vec![],
        )
    }

    fn child(parent: &Block) -> Block {
        Block::new(
            BlockHeader {
                chain_id: 1,
                height: parent.height() + 1,
                previous_block_hash: parent.hash(),
                timestamp: parent.header.timestamp + 1,
                ..Default::default()
            },
            vec![],
        )
    }

    async fn manager() -> (Arc<InMemoryBlockchainStore>, ChainManager, Block) {
        let store = Arc::new(InMemoryBlockchainStore::default());
        let manager = ChainManager::new(store.clone());
        let genesis = genesis();
        manager.create_chain(genesis.clone(), vec![]).await.unwrap();
        (store, manager, genesis)
    }

    #[tokio::test]
    async fn test_create_chain_once() {
        let (_, manager, genesis) = manager().await;

        let chain = manager.get_chain().unwrap();
        assert_eq!(chain.best_chain_hash, genesis.hash());
        assert_eq!(chain.best_chain_height, 0);
        assert!(manager.get_link(&genesis.hash()).unwrap().is_executed());

        let err = manager.create_chain(genesis, vec![]).await.unwrap_err();
        assert!(matches!(err, ChainError::ChainAlreadyCreated));
    }

    #[tokio::test]
    async fn test_operations_require_chain() {
        let manager = ChainManager::new(Arc::new(InMemoryBlockchainStore::default()));
        let block = child(&genesis());

        let err = manager.record_block(ChainBlockLink::for_block(&block)).unwrap_err();
        assert!(matches!(err, ChainError::ChainNotCreated));
        assert!(manager.get_not_executed_links(&block.hash()).is_empty());
        assert_eq!(manager.current_state_version(), StateVersion::EMPTY);
    }

    #[tokio::test]
    async fn test_set_best_chain_persists() {
        let (store, manager, genesis) = manager().await;
        let block = child(&genesis);
        manager.record_block(ChainBlockLink::for_block(&block)).unwrap();
        manager
            .set_link_execution_status(&block.hash(), ChainBlockLinkExecutionStatus::ExecutionSuccess)
            .unwrap();

        manager.set_best_chain(1, block.hash()).await.unwrap();

        let persisted = store.get_chain().await.unwrap().unwrap();
        assert_eq!(persisted.best_chain_hash, block.hash());
        assert_eq!(manager.get_chain().unwrap().best_chain_height, 1);
        assert_eq!(
            manager.current_state_version(),
            StateVersion::of_block(block.hash())
        );
    }

    #[tokio::test]
    async fn test_invalid_advance_leaves_store_untouched() {
        let (store, manager, genesis) = manager().await;
        let block = child(&genesis);
        manager.record_block(ChainBlockLink::for_block(&block)).unwrap();

        let err = manager.set_best_chain(1, block.hash()).await.unwrap_err();

        assert!(matches!(err, ChainError::InvalidAdvance(_)));
        let persisted = store.get_chain().await.unwrap().unwrap();
        assert_eq!(persisted.best_chain_hash, genesis.hash());
    }

    #[tokio::test]
    async fn test_remove_longest_branch_resets_longest() {
        let (_, manager, genesis) = manager().await;
        let a = child(&genesis);
        let b = child(&a);
        manager.record_block(ChainBlockLink::for_block(&a)).unwrap();
        manager.record_block(ChainBlockLink::for_block(&b)).unwrap();
        assert_eq!(manager.get_chain().unwrap().longest_chain_hash, b.hash());

        let removed = manager.remove_longest_branch().unwrap();

        assert_eq!(removed, vec![a.hash(), b.hash()]);
        assert_eq!(manager.get_chain().unwrap().longest_chain_hash, genesis.hash());
        assert_eq!(manager.link_count(), 1);
    }
}
