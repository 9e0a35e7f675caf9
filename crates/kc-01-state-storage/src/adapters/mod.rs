pub mod memory_blockchain;
pub mod memory_state;

pub use memory_blockchain::{InMemoryBlockchainStore, InMemoryTransactionResultStore};
pub use memory_state::InMemoryStateStore;
