pub mod blockchain;
pub mod state;

pub use blockchain::{BlockchainStore, TransactionResultStore};
pub use state::StateStore;
