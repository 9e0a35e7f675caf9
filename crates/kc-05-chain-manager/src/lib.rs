//! # kc-05-chain-manager
//!
//! Chain / fork-choice manager: owns every known block link, picks the
//! longest chain, drives the execution pipeline over it and commits the
//! best chain pointer.
//!
//! ## Attachment cycle
//!
//! ```text
//! attach_block
//!     |
//!     v
//! record link ---- Forked / AlreadyLinked ----> done
//!     |
//!     | longest chain moved
//!     v
//! unexecuted links of the longest chain, ascending
//!     |
//!     v
//! pipeline.process_block  (one block at a time)
//!     |-- Committed  -> next link
//!     |-- Rejected (retry later) -> commit the executed prefix, stop
//!     |-- Rejected   -> link failed, BlockRejected, remove longest branch
//!     |-- Aborted    -> remove longest branch, ChainError::Aborted
//!     v
//! persist best chain -> mark links executed -> BlockAccepted.. -> BestChainFound
//!     (store failure -> remove longest branch, ChainError::Aborted)
//! ```
//!
//! ## Longest-chain rule
//!
//! Greater height wins. At equal height the lower block hash wins while the
//! longest chain is still unexecuted; an executed best chain is never
//! displaced by a sibling of the same height.
//!
//! The best chain only moves over a run of committed blocks, and the
//! in-memory chain changes only after the store accepted the pointer.

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{BlockAttachService, ChainCreationService, ChainManager};
pub use config::ChainConfig;
pub use domain::{AttachCycle, AttachOutcome, ChainError, ChainResult, LinkIndex};
pub use ports::{BlockAttachApi, ChainCreationApi};
