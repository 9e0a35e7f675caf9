use crate::domain::{StateDelta, StateStoreResult, StateVersion};
use async_trait::async_trait;
use shared_types::{Hash, StateKey};

/// Versioned key/value state.
///
/// Every version has exactly one parent and reads fall through the parent
/// chain. A version accepts writes while open and is immutable once sealed.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read `key` as seen by `version`.
    async fn get(&self, version: &StateVersion, key: &StateKey) -> StateStoreResult<Option<Vec<u8>>>;

    /// Write into an open version.
    async fn put(&self, version: &StateVersion, key: StateKey, value: Vec<u8>) -> StateStoreResult<()>;

    /// Sealed version produced by executing `block_hash`, if one exists.
    async fn version_rooted_at(&self, block_hash: &Hash) -> StateStoreResult<Option<StateVersion>>;

    /// Open a writable version for `block_hash` on top of `parent`.
    ///
    /// An unsealed leftover for the same block is discarded; a sealed one
    /// is `VersionExists`.
    async fn open_version(&self, block_hash: Hash, parent: StateVersion) -> StateStoreResult<StateVersion>;

    /// Make an open version immutable.
    async fn seal_version(&self, version: &StateVersion) -> StateStoreResult<()>;

    /// Drop a version. Children of a removed version become unreadable.
    async fn remove_version(&self, version: &StateVersion) -> StateStoreResult<()>;

    /// Open, write and seal the state produced by one block.
    async fn commit_delta(
        &self,
        block_hash: Hash,
        parent: StateVersion,
        delta: StateDelta,
    ) -> StateStoreResult<StateVersion> {
        let version = self.open_version(block_hash, parent).await?;
        for (key, value) in delta {
            self.put(&version, key, value).await?;
        }
        self.seal_version(&version).await?;
        Ok(version)
    }
}
