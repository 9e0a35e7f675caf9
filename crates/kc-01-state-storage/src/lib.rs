//! # kc-01-state-storage
//!
//! Storage ports of the kernel and their in-memory adapters.
//!
//! ## Role in System
//!
//! - **State Store**: key/value state addressed by version. A version is
//!   the state after executing one block and reads fall through to the
//!   parent version, so sibling forks never see each other's writes.
//! - **Blockchain Store**: blocks, transactions and the chain record.
//! - **Transaction Result Store**: results keyed by `(tx id, block hash)`,
//!   written once.
//!
//! ## Version Chain
//!
//! ```text
//! EMPTY ── genesis ── b1 ── b2a        get(b2a, k): b2a → b1 → genesis → EMPTY
//!                        └── b2b       b2b never observes b2a's writes
//! ```
//!
//! A version is open while a block is being committed and sealed after;
//! sealed versions never change.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
