//! Simple port implementations for wiring and tests

use crate::ports::{CurrentStateVersion, TimeSource};
use kc_01_state_storage::StateVersion;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Version provider pinned to a settable version.
#[derive(Debug)]
pub struct FixedStateVersion {
    version: RwLock<StateVersion>,
}

impl FixedStateVersion {
    pub fn new(version: StateVersion) -> Self {
        Self {
            version: RwLock::new(version),
        }
    }

    pub fn set(&self, version: StateVersion) {
        *self.version.write() = version;
    }
}

impl CurrentStateVersion for FixedStateVersion {
    fn current_state_version(&self) -> StateVersion {
        *self.version.read()
    }
}
