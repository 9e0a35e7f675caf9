//! Ports of the chain manager
//!
//! Driven dependencies come from other crates: `BlockchainStore`
//! (kc-01), `BlockExecutionApi` (kc-04) and `EventPublisher` (shared-bus).

mod inbound;

pub use inbound::{BlockAttachApi, ChainCreationApi};
