//! # Error Types
//!
//! Defines error types shared by the storage ports and their callers.

use thiserror::Error;

/// Errors raised by the blockchain storage service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Block not found in storage.
    #[error("Block not found: {0}")]
    NotFound(String),

    /// Chain record was never created.
    #[error("Chain not created")]
    ChainNotCreated,

    /// Chain record already exists.
    #[error("Chain already created with genesis {0}")]
    ChainAlreadyCreated(String),

    /// A transaction result for the same (tx, block) pair already exists
    /// with different contents.
    #[error("Transaction result conflict for tx {tx} in block {block}")]
    ResultConflict { tx: String, block: String },

    /// Backend could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
