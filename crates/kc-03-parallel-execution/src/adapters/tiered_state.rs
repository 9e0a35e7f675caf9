//! Tiered State View Adapter
//!
//! What one transaction sees: the writes already merged in this batch on top
//! of the parent version. Every key read is recorded so the coordinator can
//! check it against the declared access pattern.

use crate::ports::outbound::StateReader;
use async_trait::async_trait;
use kc_01_state_storage::{StateDelta, StateStore, StateStoreResult, StateVersion};
use parking_lot::Mutex;
use shared_types::StateKey;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct TieredStateView {
    store: Arc<dyn StateStore>,
    parent: StateVersion,
    overlay: Arc<StateDelta>,
    reads: Mutex<BTreeSet<StateKey>>,
}

impl TieredStateView {
    pub fn new(store: Arc<dyn StateStore>, parent: StateVersion, overlay: Arc<StateDelta>) -> Self {
        Self {
            store,
            parent,
            overlay,
            reads: Mutex::new(BTreeSet::new()),
        }
    }

    /// Keys read through this view so far
    pub fn reads(&self) -> BTreeSet<StateKey> {
        self.reads.lock().clone()
    }

    pub fn into_reads(self) -> BTreeSet<StateKey> {
        self.reads.into_inner()
    }
}

#[async_trait]
impl StateReader for TieredStateView {
    async fn get(&self, key: &StateKey) -> StateStoreResult<Option<Vec<u8>>> {
        self.reads.lock().insert(key.clone());
        if let Some(value) = self.overlay.get(key) {
            return Ok(Some(value.clone()));
        }
        self.store.get(&self.parent, key).await
    }
}
