//! # kc-02-consensus-rounds
//!
//! Consensus round scheduler: a read-side projection of the round state the
//! consensus contract persists.
//!
//! ## Architecture
//!
//! Miners take turns inside a round. Every miner has an order position and
//! an expected mining time; slot `i` starts at `round_start + i * interval`.
//! When the last slot passes, the consensus contract writes the next round.
//!
//! ```text
//! round n:   | m0 | m1 | m2 |
//! round n+1:                | m0 | m1 | m2 |
//!            ^ expected mining times, one interval apart
//! ```
//!
//! The scheduler owns no timers. Callers that drive block production poll
//! `distance_to_time_slot` and decide when to act.
//!
//! ## Failure Policy
//!
//! A missing or unreadable round is the normal startup state: the round
//! number reads as `0`, the miner list as empty and the round as `None`.
//! Only `miner_info` for an address outside the round is an error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kc_02_consensus_rounds::{ConsensusRoundScheduler, ConsensusConfig};
//!
//! let scheduler = ConsensusRoundScheduler::new(state_store, version_provider, ConsensusConfig::default());
//! let wait_ms = scheduler.distance_to_time_slot(&miner).await;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{FixedStateVersion, ManualTimeSource};
pub use config::ConsensusConfig;
pub use domain::{
    consensus_state, ConsensusError, ConsensusResult, MinerInRound, Miners, Round,
};
pub use ports::{CurrentStateVersion, SystemTimeSource, TimeSource};
pub use service::ConsensusRoundScheduler;
