//! # Log Bloom
//!
//! 2048-bit bloom filter over log addresses, names and indexed topics.
//! Each value sets three bits chosen from its Keccak-256 digest.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha3::{Digest, Keccak256};

/// Size of a bloom in bytes.
pub const BLOOM_BYTES: usize = 256;

#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bloom(#[serde_as(as = "Bytes")] [u8; BLOOM_BYTES]);

impl Default for Bloom {
    fn default() -> Self {
        Self([0u8; BLOOM_BYTES])
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bloom({} bits)", self.bits_set())
    }
}

impl Bloom {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; BLOOM_BYTES] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn add_value(&mut self, value: &[u8]) {
        for (byte, mask) in Self::positions(value) {
            self.0[byte] |= mask;
        }
    }

    pub fn contains_value(&self, value: &[u8]) -> bool {
        Self::positions(value)
            .iter()
            .all(|(byte, mask)| self.0[*byte] & mask != 0)
    }

    /// Merge `other` into this bloom.
    pub fn accrue_bloom(&mut self, other: &Bloom) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= *b;
        }
    }

    /// Union of a set of blooms.
    pub fn combine<'a>(blooms: impl IntoIterator<Item = &'a Bloom>) -> Bloom {
        let mut out = Bloom::default();
        for bloom in blooms {
            out.accrue_bloom(bloom);
        }
        out
    }

    fn bits_set(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }

    fn positions(value: &[u8]) -> [(usize, u8); 3] {
        let digest = Keccak256::digest(value);
        let mut out = [(0usize, 0u8); 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let bit = ((u16::from(digest[2 * i]) << 8) | u16::from(digest[2 * i + 1])) & 0x07ff;
            let byte = BLOOM_BYTES - 1 - usize::from(bit / 8);
            *slot = (byte, 1u8 << (bit % 8));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_values_are_found() {
        let mut bloom = Bloom::default();
        assert!(bloom.is_empty());

        bloom.add_value(b"Transferred");
        assert!(!bloom.is_empty());
        assert!(bloom.contains_value(b"Transferred"));
    }

    #[test]
    fn test_combine_is_union() {
        let mut a = Bloom::default();
        a.add_value(b"a");
        let mut b = Bloom::default();
        b.add_value(b"b");

        let both = Bloom::combine([&a, &b]);
        assert!(both.contains_value(b"a"));
        assert!(both.contains_value(b"b"));
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(Bloom::from_bytes(&[0u8; 10]).is_none());
        assert!(Bloom::from_bytes(&[0u8; BLOOM_BYTES]).is_some());
    }
}
