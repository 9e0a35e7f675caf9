//! Chain event log
//!
//! Subscribes to the event bus and writes one structured line per event.

use kernel_telemetry::log_block_event;
use shared_bus::{BlockchainEvent, EventFilter, InMemoryEventBus, Subscription};
use shared_types::short_hex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

const COMPONENT: &str = "chain-events";

/// Running totals of what the observer has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedEvents {
    pub accepted: u64,
    pub rejected: u64,
    pub best_chain_updates: u64,
}

impl ObservedEvents {
    fn record(&mut self, event: &BlockchainEvent) {
        match event {
            BlockchainEvent::BlockAccepted(_) => self.accepted += 1,
            BlockchainEvent::BlockRejected { .. } => self.rejected += 1,
            BlockchainEvent::BestChainFound { .. } => self.best_chain_updates += 1,
        }
    }
}

pub fn log_event(event: &BlockchainEvent) {
    match event {
        BlockchainEvent::BlockAccepted(set) => {
            let failed = set.ordered_results().iter().filter(|r| r.is_failed()).count();
            log_block_event!(
                info,
                COMPONENT,
                "Block executed",
                set.height(),
                short_hex(&set.block_hash()),
                tx_count = set.transaction_ids().len(),
                failed_txs = failed
            );
        }
        BlockchainEvent::BlockRejected {
            block_hash,
            block_height,
            reason,
        } => {
            log_block_event!(
                warn,
                COMPONENT,
                "Block rejected",
                *block_height,
                short_hex(block_hash),
                reason = %reason
            );
        }
        BlockchainEvent::BestChainFound {
            block_hash,
            block_height,
            block_executed_sets,
        } => {
            log_block_event!(
                info,
                COMPONENT,
                "Best chain found",
                *block_height,
                short_hex(block_hash),
                executed_blocks = block_executed_sets.len()
            );
        }
    }
}

/// Log every event until the bus closes or shutdown is signalled.
pub async fn run(mut subscription: Subscription, mut shutdown: watch::Receiver<bool>) -> ObservedEvents {
    let mut observed = ObservedEvents::default();
    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    log_event(&event);
                    observed.record(&event);
                }
                None => break,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    // Flush what was published before shutdown.
    for event in subscription.drain() {
        log_event(&event);
        observed.record(&event);
    }
    debug!(?observed, "Chain event observer stopped");
    observed
}

pub fn spawn(bus: &InMemoryEventBus, shutdown: watch::Receiver<bool>) -> JoinHandle<ObservedEvents> {
    tokio::spawn(run(bus.subscribe(EventFilter::all()), shutdown))
}
