//! # Event Publisher
//!
//! Fire-and-forget side of the bus. Besides fanning events out, the bus
//! counts what it carried per topic and remembers the last best chain tip
//! it announced, so an observer that subscribes late can still tell where
//! the chain stands.

use crate::events::{BlockchainEvent, EventFilter, EventTopic};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{short_hex, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Outbound port for chain notifications.
///
/// Publishing never waits on observers and never fails; an event nobody
/// listens to is dropped.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Returns the number of subscribers the event reached.
    async fn publish(&self, event: BlockchainEvent) -> usize;
}

/// Broadcast-channel bus for a single process.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<BlockchainEvent>,
    execution_events: AtomicU64,
    chain_events: AtomicU64,
    /// `(height, hash)` of the last `BestChainFound`
    best_chain_tip: RwLock<Option<(u64, Hash)>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` events are buffered per subscriber before it lags.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            execution_events: AtomicU64::new(0),
            chain_events: AtomicU64::new(0),
            best_chain_tip: RwLock::new(None),
            capacity,
        }
    }

    /// Subscribe to events matching `filter`. Only events published after
    /// this call are seen.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published on `topic`; `EventTopic::All` sums every topic.
    #[must_use]
    pub fn published(&self, topic: EventTopic) -> u64 {
        let execution = self.execution_events.load(Ordering::Relaxed);
        let chain = self.chain_events.load(Ordering::Relaxed);
        match topic {
            EventTopic::Execution => execution,
            EventTopic::Chain => chain,
            EventTopic::All => execution + chain,
        }
    }

    /// Height and hash of the last announced best chain tip.
    #[must_use]
    pub fn best_chain_tip(&self) -> Option<(u64, Hash)> {
        *self.best_chain_tip.read()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BlockchainEvent) -> usize {
        let topic = event.topic();
        match &event {
            BlockchainEvent::BestChainFound {
                block_hash,
                block_height,
                ..
            } => {
                self.chain_events.fetch_add(1, Ordering::Relaxed);
                *self.best_chain_tip.write() = Some((*block_height, *block_hash));
            }
            BlockchainEvent::BlockAccepted(_) | BlockchainEvent::BlockRejected { .. } => {
                self.execution_events.fetch_add(1, Ordering::Relaxed);
            }
        }

        let block = short_hex(&event.block_hash());
        match self.sender.send(event) {
            Ok(receivers) => {
                trace!(?topic, %block, receivers, "Event published");
                receivers
            }
            Err(_) => {
                trace!(?topic, %block, "Event dropped (no subscribers)");
                0
            }
        }
    }
}
