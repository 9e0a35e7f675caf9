//! Link arena and longest-chain rule
//!
//! Links are owned by one index keyed by block hash; the `Chain` record only
//! holds hashes into it. Everything here is synchronous so a caller can hold
//! a write lock across a whole mutation.

use super::error::{ChainError, ChainResult};
use shared_types::{
    short_hex, BlockAttachOperationStatus, Chain, ChainBlockLink, ChainBlockLinkExecutionStatus,
    Hash,
};
use std::collections::{HashMap, HashSet};

pub struct LinkIndex {
    chain: Chain,
    links: HashMap<Hash, ChainBlockLink>,
    children: HashMap<Hash, Vec<Hash>>,
}

impl LinkIndex {
    /// Index rooted at an executed genesis link.
    pub fn new(chain: Chain, mut genesis: ChainBlockLink) -> Self {
        genesis.execution_status = ChainBlockLinkExecutionStatus::ExecutionSuccess;
        let mut links = HashMap::new();
        links.insert(genesis.block_hash, genesis);
        Self {
            chain,
            links,
            children: HashMap::new(),
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn link(&self, hash: &Hash) -> Option<&ChainBlockLink> {
        self.links.get(hash)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Insert a new link and apply the longest-chain rule.
    ///
    /// Greater height wins. At equal height the lower hash wins, but only
    /// while the longest chain is still ahead of the best chain: an executed
    /// best chain is never displaced by an equal-height sibling.
    pub fn record(&mut self, mut link: ChainBlockLink) -> ChainResult<BlockAttachOperationStatus> {
        let hash = link.block_hash;

        if let Some(existing) = self.links.get(&hash) {
            if existing.previous_block_hash == link.previous_block_hash {
                return Ok(BlockAttachOperationStatus::AlreadyLinked);
            }
            return Err(ChainError::DuplicateBlock(short_hex(&hash)));
        }

        let parent = self
            .links
            .get(&link.previous_block_hash)
            .ok_or_else(|| ChainError::UnknownParent {
                block: short_hex(&hash),
                parent: short_hex(&link.previous_block_hash),
            })?;

        if link.height != parent.height + 1 {
            return Err(ChainError::InvalidHeight {
                block: short_hex(&hash),
                expected: parent.height + 1,
                actual: link.height,
            });
        }
        if parent.is_failed() {
            return Err(ChainError::ParentExecutionFailed(short_hex(&hash)));
        }

        link.execution_status = ChainBlockLinkExecutionStatus::NotExecuted;
        let height = link.height;
        let previous = link.previous_block_hash;
        self.links.insert(hash, link);
        self.children.entry(previous).or_default().push(hash);
        self.chain.branches.remove(&previous);
        self.chain.branches.insert(hash, height);

        let chain = &mut self.chain;
        let status = if height > chain.longest_chain_height {
            if previous == chain.longest_chain_hash {
                BlockAttachOperationStatus::ExtendedLongestChain
            } else {
                BlockAttachOperationStatus::ReplacedLongestChain
            }
        } else if height == chain.longest_chain_height
            && chain.longest_chain_height > chain.best_chain_height
            && hash < chain.longest_chain_hash
        {
            BlockAttachOperationStatus::ReplacedLongestChain
        } else {
            BlockAttachOperationStatus::Forked
        };

        if status.longest_chain_found() {
            chain.longest_chain_hash = hash;
            chain.longest_chain_height = height;
        }
        Ok(status)
    }

    /// Unexecuted links ending at `from`, ascending by height.
    ///
    /// The walk stops at the first executed ancestor. A branch that hangs off
    /// a failed link yields nothing.
    pub fn not_executed_links(&self, from: &Hash) -> Vec<ChainBlockLink> {
        let mut pending = Vec::new();
        let mut cursor = *from;
        while let Some(link) = self.links.get(&cursor) {
            match link.execution_status {
                ChainBlockLinkExecutionStatus::NotExecuted => {
                    pending.push(link.clone());
                    cursor = link.previous_block_hash;
                }
                ChainBlockLinkExecutionStatus::ExecutionFailed => return Vec::new(),
                ChainBlockLinkExecutionStatus::ExecutionSuccess => break,
            }
        }
        pending.reverse();
        pending
    }

    /// Whether the best chain may move to `(height, hash)`.
    pub fn check_advance(&self, height: u64, hash: &Hash) -> ChainResult<()> {
        let link = self
            .links
            .get(hash)
            .ok_or_else(|| ChainError::UnknownLink(short_hex(hash)))?;

        if !link.is_executed() {
            return Err(ChainError::InvalidAdvance(format!(
                "block {} is {:?}",
                short_hex(hash),
                link.execution_status
            )));
        }
        if link.height != height {
            return Err(ChainError::InvalidAdvance(format!(
                "block {} is at height {}, not {}",
                short_hex(hash),
                link.height,
                height
            )));
        }
        if height <= self.chain.best_chain_height {
            return Err(ChainError::InvalidAdvance(format!(
                "height {} does not exceed best chain height {}",
                height, self.chain.best_chain_height
            )));
        }

        let mut cursor = link.previous_block_hash;
        while cursor != self.chain.best_chain_hash && cursor != self.chain.genesis_block_hash {
            let ancestor = self.links.get(&cursor).ok_or_else(|| {
                ChainError::InvalidAdvance(format!("ancestor {} is unknown", short_hex(&cursor)))
            })?;
            if !ancestor.is_executed() {
                return Err(ChainError::InvalidAdvance(format!(
                    "ancestor {} at height {} is {:?}",
                    short_hex(&cursor),
                    ancestor.height,
                    ancestor.execution_status
                )));
            }
            cursor = ancestor.previous_block_hash;
        }
        Ok(())
    }

    /// Move the best chain pointer; call `check_advance` first.
    pub fn advance_best(&mut self, height: u64, hash: Hash) {
        let chain = &mut self.chain;
        chain.best_chain_height = height;
        chain.best_chain_hash = hash;
        if height > chain.longest_chain_height {
            chain.longest_chain_height = height;
            chain.longest_chain_hash = hash;
        }
    }

    /// Drop the unexecuted links of the longest candidate branch and every
    /// unexecuted link hanging below them, then reset longest to best.
    ///
    /// Failed links stay as tombstones so the same block is not recorded
    /// and executed again. Returns the removed hashes.
    pub fn remove_longest_branch(&mut self) -> Vec<Hash> {
        let best = self.chain.best_chain_hash;
        let mut doomed = HashSet::new();
        let mut failed = Vec::new();

        let mut cursor = self.chain.longest_chain_hash;
        while cursor != best {
            let Some(link) = self.links.get(&cursor) else {
                break;
            };
            match link.execution_status {
                ChainBlockLinkExecutionStatus::NotExecuted => {
                    doomed.insert(cursor);
                }
                ChainBlockLinkExecutionStatus::ExecutionFailed => failed.push(cursor),
                ChainBlockLinkExecutionStatus::ExecutionSuccess => break,
            }
            cursor = link.previous_block_hash;
        }

        // Only descendants of the walked branch can be orphaned
        let mut frontier: Vec<Hash> = doomed.iter().chain(&failed).copied().collect();
        while let Some(parent) = frontier.pop() {
            for child in self.children.get(&parent).into_iter().flatten() {
                let live = self
                    .links
                    .get(child)
                    .is_some_and(|l| l.execution_status == ChainBlockLinkExecutionStatus::NotExecuted);
                if live && doomed.insert(*child) {
                    frontier.push(*child);
                }
            }
        }

        let mut removed: Vec<(u64, Hash)> = Vec::with_capacity(doomed.len());
        let mut touched = Vec::with_capacity(doomed.len() + failed.len());
        for hash in &doomed {
            if let Some(link) = self.links.remove(hash) {
                self.children.remove(hash);
                if let Some(siblings) = self.children.get_mut(&link.previous_block_hash) {
                    siblings.retain(|h| h != hash);
                }
                self.chain.branches.remove(hash);
                touched.push(link.previous_block_hash);
                removed.push((link.height, *hash));
            }
        }
        for hash in &failed {
            self.chain.branches.remove(hash);
            if let Some(link) = self.links.get(hash) {
                touched.push(link.previous_block_hash);
            }
        }
        removed.sort();

        // A surviving parent with no live child is a tip again
        for parent in touched {
            if doomed.contains(&parent) {
                continue;
            }
            let Some(link) = self.links.get(&parent) else {
                continue;
            };
            if link.is_failed() {
                continue;
            }
            let has_live_child = self
                .children
                .get(&parent)
                .into_iter()
                .flatten()
                .any(|c| self.links.get(c).is_some_and(|l| !l.is_failed()));
            if !has_live_child {
                self.chain.branches.insert(parent, link.height);
            }
        }

        self.chain.longest_chain_hash = self.chain.best_chain_hash;
        self.chain.longest_chain_height = self.chain.best_chain_height;

        removed.into_iter().map(|(_, hash)| hash).collect()
    }

    /// Mark `hashes` executed and move the best chain to `(height, hash)`.
    /// On error nothing changes.
    pub fn commit_executed(&mut self, hashes: &[Hash], height: u64, hash: Hash) -> ChainResult<()> {
        self.set_execution_statuses(hashes, ChainBlockLinkExecutionStatus::ExecutionSuccess)?;
        if let Err(e) = self.check_advance(height, &hash) {
            for h in hashes {
                if let Some(link) = self.links.get_mut(h) {
                    link.execution_status = ChainBlockLinkExecutionStatus::NotExecuted;
                }
            }
            return Err(e);
        }
        self.advance_best(height, hash);
        Ok(())
    }

    /// Only `NotExecuted -> ExecutionSuccess | ExecutionFailed` is allowed.
    pub fn check_transitions(
        &self,
        hashes: &[Hash],
        status: ChainBlockLinkExecutionStatus,
    ) -> ChainResult<()> {
        for hash in hashes {
            let link = self
                .links
                .get(hash)
                .ok_or_else(|| ChainError::UnknownLink(short_hex(hash)))?;
            if link.execution_status != ChainBlockLinkExecutionStatus::NotExecuted
                || status == ChainBlockLinkExecutionStatus::NotExecuted
            {
                return Err(ChainError::InvalidStatusTransition {
                    block: short_hex(hash),
                    from: link.execution_status,
                    to: status,
                });
            }
        }
        Ok(())
    }

    /// Apply `status` to every link in `hashes`, or to none of them.
    pub fn set_execution_statuses(
        &mut self,
        hashes: &[Hash],
        status: ChainBlockLinkExecutionStatus,
    ) -> ChainResult<()> {
        self.check_transitions(hashes, status)?;
        for hash in hashes {
            if let Some(link) = self.links.get_mut(hash) {
                link.execution_status = status;
            }
        }
        Ok(())
    }
}
