//! # Shared Types Crate
//!
//! This crate contains the entities every kernel crate agrees on: blocks,
//! transactions, transaction results, chain block links and the single
//! `Chain` pointer record.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Content Addressing**: Blocks and transactions are identified by the
//!   Keccak-256 hash of their contents. Nothing here caches a hash.
//! - **Arena Links**: `Chain` refers to links by hash only; the links
//!   themselves are owned by the chain manager's index.

pub mod bloom;
pub mod chain;
pub mod entities;
pub mod errors;
pub mod merkle;

pub use bloom::Bloom;
pub use chain::*;
pub use entities::*;
pub use errors::*;
pub use merkle::{merkle_root, MerkleTree};
