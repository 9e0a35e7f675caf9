//! State delta: the writes produced by executing a block (or one
//! transaction of it), ordered by key so its commitment is deterministic.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{Hash, StateKey};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    writes: BTreeMap<StateKey, Vec<u8>>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: StateKey, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    pub fn get(&self, key: &StateKey) -> Option<&Vec<u8>> {
        self.writes.get(key)
    }

    pub fn contains_key(&self, key: &StateKey) -> bool {
        self.writes.contains_key(key)
    }

    /// Later writes win.
    pub fn merge(&mut self, other: StateDelta) {
        self.writes.extend(other.writes);
    }

    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.writes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Vec<u8>)> {
        self.writes.iter()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Commitment to this delta applied on top of `parent`.
    ///
    /// Chaining the parent hash makes two forks with identical writes
    /// produce different roots.
    pub fn root(&self, parent: &Hash) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(parent);
        for (key, value) in &self.writes {
            hasher.update(key.encode());
            hasher.update((value.len() as u64).to_le_bytes());
            hasher.update(value);
        }
        hasher.finalize().into()
    }
}

impl IntoIterator for StateDelta {
    type Item = (StateKey, Vec<u8>);
    type IntoIter = std::collections::btree_map::IntoIter<StateKey, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

impl FromIterator<(StateKey, Vec<u8>)> for StateDelta {
    fn from_iter<I: IntoIterator<Item = (StateKey, Vec<u8>)>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}
