//! # Genesis Module
//!
//! Genesis transactions for chain creation.
//!
//! The genesis block itself is built by the chain creation service:
//!
//! - Height: 0
//! - Previous block hash: 32 zero bytes
//! - Timestamp: `ChainConfig::genesis_timestamp`
//!
//! This module only decides what the genesis block executes: the first
//! consensus round for the configured miners, plus any seed transactions.

pub mod builder;

pub use builder::{GenesisBuilder, GenesisError};
