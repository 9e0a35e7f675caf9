//! # Native System Contracts
//!
//! Contracts compiled into the node. They stand in for a contract VM so
//! that genesis and ordinary blocks can run end to end.
//!
//! | Contract | Address | Methods |
//! |----------|---------|---------|
//! | Consensus | `ConsensusConfig::consensus_contract` | `InitialRound`, `NextRound`, `UpdateValue` |
//! | Key/value | [`KV_CONTRACT`] | `Set`, `Increment`, `Transfer` |
//!
//! Parameters are bincode encoded. Every method's state access follows
//! from its parameters alone, which lets [`SystemAccessAnalyzer`] declare
//! access patterns without reading state.

pub mod consensus;
pub mod kv;

use async_trait::async_trait;
use kc_01_state_storage::{StateDelta, StateStoreError, StateStoreResult};
use kc_03_parallel_execution::{
    AccessPattern, AccessPatternAnalyzer, AnalysisError, ContractFault, ExecutionContext,
    StateReader, TransactionExecutor, TransactionTrace,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{short_hex, Address, LogEvent, Transaction};
use thiserror::Error;
use tracing::trace;

/// Well-known address of the key/value contract.
pub const KV_CONTRACT: Address = [
    0x6b, 0x76, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x02,
];

/// Why a contract call did not succeed.
#[derive(Debug, Error)]
pub enum CallError {
    /// The contract reverted; the transaction is `Failed`, the block goes on.
    #[error("{0}")]
    Fault(String),

    /// State could not be read; the whole batch aborts.
    #[error(transparent)]
    State(#[from] StateStoreError),
}

impl CallError {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }
}

pub type CallResult<T> = Result<T, CallError>;

/// Writes, return value and logs of a successful call.
#[derive(Debug, Default)]
pub struct CallOutput {
    pub writes: StateDelta,
    pub return_value: Vec<u8>,
    pub logs: Vec<LogEvent>,
}

impl CallOutput {
    fn into_trace(self) -> TransactionTrace {
        TransactionTrace::success(self.return_value, self.writes).with_logs(self.logs)
    }
}

pub fn encode_params<T: Serialize>(params: &T) -> Vec<u8> {
    // Serializing plain structs into a Vec cannot fail.
    bincode::serialize(params).unwrap_or_default()
}

pub(crate) fn decode_params<T: DeserializeOwned>(transaction: &Transaction) -> CallResult<T> {
    bincode::deserialize(&transaction.params).map_err(|e| {
        CallError::fault(format!(
            "invalid parameters for {}: {e}",
            transaction.method_name
        ))
    })
}

fn unknown_method(transaction: &Transaction) -> String {
    format!(
        "unknown method {} on contract {}",
        transaction.method_name,
        hex::encode(transaction.to)
    )
}

/// Dispatches a transaction to the native contract at its `to` address.
pub struct SystemContractExecutor {
    consensus_contract: Address,
}

impl SystemContractExecutor {
    pub fn new(consensus_contract: Address) -> Self {
        Self { consensus_contract }
    }
}

#[async_trait]
impl TransactionExecutor for SystemContractExecutor {
    async fn execute(
        &self,
        context: &ExecutionContext,
        transaction: &Transaction,
        state: &dyn StateReader,
    ) -> StateStoreResult<TransactionTrace> {
        let outcome = if transaction.to == self.consensus_contract {
            consensus::call(context, transaction, state).await
        } else if transaction.to == KV_CONTRACT {
            kv::call(transaction, state).await
        } else {
            Err(CallError::fault(format!(
                "no contract at {}",
                hex::encode(transaction.to)
            )))
        };

        match outcome {
            Ok(output) => Ok(output.into_trace()),
            Err(CallError::Fault(message)) => {
                trace!(
                    tx = %short_hex(&transaction.hash()),
                    method = %transaction.method_name,
                    reason = %message,
                    "Contract reverted"
                );
                Ok(TransactionTrace::failed(ContractFault::new(message)))
            }
            Err(CallError::State(e)) => Err(e),
        }
    }
}

/// Derives access patterns from method names and parameters.
pub struct SystemAccessAnalyzer {
    consensus_contract: Address,
}

impl SystemAccessAnalyzer {
    pub fn new(consensus_contract: Address) -> Self {
        Self { consensus_contract }
    }
}

#[async_trait]
impl AccessPatternAnalyzer for SystemAccessAnalyzer {
    async fn analyze(&self, transaction: &Transaction) -> Result<AccessPattern, AnalysisError> {
        let pattern = if transaction.to == self.consensus_contract {
            consensus::access_pattern(transaction)
        } else if transaction.to == KV_CONTRACT {
            kv::access_pattern(transaction)
        } else {
            Err(CallError::fault(format!(
                "no contract at {}",
                hex::encode(transaction.to)
            )))
        };

        pattern.map_err(|e| AnalysisError::DecodeFailed(e.to_string()))
    }
}
