//! Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::{ExecutionContext, TransactionTrace};
use crate::domain::errors::AnalysisError;
use crate::domain::value_objects::AccessPattern;
use async_trait::async_trait;
use kc_01_state_storage::StateStoreResult;
use shared_types::{StateKey, Transaction};

/// State access pattern analyzer
///
/// Determines the keys a transaction may read and write before it runs.
#[async_trait]
pub trait AccessPatternAnalyzer: Send + Sync {
    async fn analyze(&self, transaction: &Transaction) -> Result<AccessPattern, AnalysisError>;
}

/// Read access to the state a transaction executes against
#[async_trait]
pub trait StateReader: Send + Sync {
    async fn get(&self, key: &StateKey) -> StateStoreResult<Option<Vec<u8>>>;
}

/// Executes a single transaction
///
/// Contract faults are reported inside the trace. An `Err` means the state
/// could not be read and aborts the whole batch.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn execute(
        &self,
        context: &ExecutionContext,
        transaction: &Transaction,
        state: &dyn StateReader,
    ) -> StateStoreResult<TransactionTrace>;
}
