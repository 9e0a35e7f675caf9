//! # Node Runtime Library
//!
//! Wiring of the kernel services into a runnable node. The entry point is
//! the `main.rs` binary; the library is exposed for integration tests.
//!
//! ## Modules
//!
//! - `config/` - `NodeConfig`: per-crate configs plus env overrides
//! - `contracts/` - native consensus and key/value contracts
//! - `genesis/` - genesis transactions
//! - `wiring` - service construction over in-memory adapters
//! - `observer` - structured log line per chain event
//! - `runtime` - `NodeRuntime` lifecycle

#![allow(clippy::type_complexity)]

pub mod config;
pub mod contracts;
pub mod genesis;
pub mod observer;
pub mod runtime;
pub mod wiring;

pub use config::{ConfigError, NodeConfig};
pub use contracts::{SystemAccessAnalyzer, SystemContractExecutor, KV_CONTRACT};
pub use genesis::{GenesisBuilder, GenesisError};
pub use runtime::NodeRuntime;
pub use wiring::NodeServices;
