//! # Blockchain Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{BlockExecutedSet, Hash};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockchainEvent {
    // =========================================================================
    // EXECUTION
    // =========================================================================
    /// A block was executed and its results persisted.
    BlockAccepted(BlockExecutedSet),

    /// A block failed validation or execution and was discarded.
    BlockRejected {
        /// The rejected block's hash.
        block_hash: Hash,
        /// Height of the rejected block.
        block_height: u64,
        /// Reason for rejection.
        reason: String,
    },

    // =========================================================================
    // CHAIN
    // =========================================================================
    /// The best chain advanced after a whole attachment batch succeeded.
    BestChainFound {
        /// New best chain tip.
        block_hash: Hash,
        /// New best chain height.
        block_height: u64,
        /// Every block executed in the batch, in height order.
        block_executed_sets: Vec<BlockExecutedSet>,
    },
}

impl BlockchainEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockAccepted(_) | Self::BlockRejected { .. } => EventTopic::Execution,
            Self::BestChainFound { .. } => EventTopic::Chain,
        }
    }

    /// Hash of the block the event is about.
    #[must_use]
    pub fn block_hash(&self) -> Hash {
        match self {
            Self::BlockAccepted(set) => set.block_hash(),
            Self::BlockRejected { block_hash, .. } | Self::BestChainFound { block_hash, .. } => {
                *block_hash
            }
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Per-block execution outcomes.
    Execution,
    /// Best chain movements.
    Chain,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to subscribe to (empty = all).
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self {
            topics: vec![EventTopic::All],
        }
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BlockchainEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
