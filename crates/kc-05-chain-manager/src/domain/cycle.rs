//! What one attachment cycle did

use kc_04_block_execution::RejectReason;
use shared_types::{BlockAttachOperationStatus, BlockExecutedSet, Hash};

/// Outcome of executing the links of the longest chain.
#[derive(Debug, Clone)]
pub enum AttachCycle {
    /// The longest chain had no unexecuted links.
    Idle,
    /// Every link executed; the best chain moved to the last one.
    BestChainAdvanced {
        block_hash: Hash,
        block_height: u64,
        executed: Vec<BlockExecutedSet>,
    },
    /// A block asked to be retried later. The blocks before it are
    /// committed and the best chain moved to the last of them (`executed`);
    /// the deferred block and everything above it stay unexecuted on the
    /// longest chain for the next cycle.
    Deferred {
        block_hash: Hash,
        reason: RejectReason,
        executed: Vec<BlockExecutedSet>,
    },
    /// A block was permanently rejected and the longest branch rolled back.
    BranchDiscarded {
        block_hash: Hash,
        reason: RejectReason,
        removed: Vec<Hash>,
    },
}

impl AttachCycle {
    pub fn best_chain_advanced(&self) -> bool {
        matches!(self, Self::BestChainAdvanced { .. })
    }
}

/// Result of attaching one block.
#[derive(Debug, Clone)]
pub struct AttachOutcome {
    pub status: BlockAttachOperationStatus,
    /// Present when the longest chain moved and a cycle ran
    pub cycle: Option<AttachCycle>,
}

impl AttachOutcome {
    pub fn best_chain_advanced(&self) -> bool {
        self.cycle
            .as_ref()
            .is_some_and(AttachCycle::best_chain_advanced)
    }
}
