use crate::domain::{StateStoreError, StateStoreResult, StateVersion};
use crate::ports::StateStore;
use async_trait::async_trait;
use shared_types::{Hash, StateKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::trace;

struct VersionEntry {
    parent: StateVersion,
    writes: HashMap<StateKey, Vec<u8>>,
    sealed: bool,
}

/// In-memory implementation of StateStore
pub struct InMemoryStateStore {
    versions: RwLock<HashMap<StateVersion, VersionEntry>>,
    available: AtomicBool,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            versions: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn version_count(&self) -> usize {
        self.versions.read().map(|v| v.len()).unwrap_or(0)
    }

    fn ensure_available(&self) -> StateStoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StateStoreError::Unavailable("in-memory store disabled".into()))
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, version: &StateVersion, key: &StateKey) -> StateStoreResult<Option<Vec<u8>>> {
        self.ensure_available()?;
        let versions = self
            .versions
            .read()
            .map_err(|_| StateStoreError::LockPoisoned)?;

        let mut cursor = *version;
        loop {
            if cursor.is_empty() {
                return Ok(None);
            }
            let entry = versions
                .get(&cursor)
                .ok_or(StateStoreError::UnknownVersion(cursor))?;
            if let Some(value) = entry.writes.get(key) {
                return Ok(Some(value.clone()));
            }
            cursor = entry.parent;
        }
    }

    async fn put(&self, version: &StateVersion, key: StateKey, value: Vec<u8>) -> StateStoreResult<()> {
        self.ensure_available()?;
        let mut versions = self
            .versions
            .write()
            .map_err(|_| StateStoreError::LockPoisoned)?;
        let entry = versions
            .get_mut(version)
            .ok_or(StateStoreError::UnknownVersion(*version))?;
        if entry.sealed {
            return Err(StateStoreError::VersionSealed(*version));
        }
        entry.writes.insert(key, value);
        Ok(())
    }

    async fn version_rooted_at(&self, block_hash: &Hash) -> StateStoreResult<Option<StateVersion>> {
        self.ensure_available()?;
        let versions = self
            .versions
            .read()
            .map_err(|_| StateStoreError::LockPoisoned)?;
        let version = StateVersion::of_block(*block_hash);
        Ok(versions
            .get(&version)
            .filter(|entry| entry.sealed)
            .map(|_| version))
    }

    async fn open_version(&self, block_hash: Hash, parent: StateVersion) -> StateStoreResult<StateVersion> {
        self.ensure_available()?;
        let mut versions = self
            .versions
            .write()
            .map_err(|_| StateStoreError::LockPoisoned)?;

        if !parent.is_empty() && !versions.get(&parent).is_some_and(|p| p.sealed) {
            return Err(StateStoreError::UnknownVersion(parent));
        }

        let version = StateVersion::of_block(block_hash);
        if versions.get(&version).is_some_and(|v| v.sealed) {
            return Err(StateStoreError::VersionExists(version));
        }

        trace!(version = %version, parent = %parent, "Opening state version");
        versions.insert(
            version,
            VersionEntry {
                parent,
                writes: HashMap::new(),
                sealed: false,
            },
        );
        Ok(version)
    }

    async fn seal_version(&self, version: &StateVersion) -> StateStoreResult<()> {
        self.ensure_available()?;
        let mut versions = self
            .versions
            .write()
            .map_err(|_| StateStoreError::LockPoisoned)?;
        let entry = versions
            .get_mut(version)
            .ok_or(StateStoreError::UnknownVersion(*version))?;
        entry.sealed = true;
        Ok(())
    }

    async fn remove_version(&self, version: &StateVersion) -> StateStoreResult<()> {
        self.ensure_available()?;
        let mut versions = self
            .versions
            .write()
            .map_err(|_| StateStoreError::LockPoisoned)?;
        versions.remove(version);
        Ok(())
    }
}
