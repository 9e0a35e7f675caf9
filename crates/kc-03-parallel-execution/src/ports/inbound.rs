//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::BatchExecutionOutput;
use crate::domain::errors::ExecutionResult;
use async_trait::async_trait;
use kc_01_state_storage::StateVersion;
use shared_types::{BlockHeader, Transaction};

/// Parallel execution API
#[async_trait]
pub trait ParallelExecutionApi: Send + Sync {
    /// Execute one block's transactions on top of `parent`.
    ///
    /// The state store is not written; the merged delta is returned for the
    /// caller to commit. `header` supplies the block context and the fields
    /// copied into the output block.
    async fn execute_batch(
        &self,
        header: &BlockHeader,
        transactions: &[Transaction],
        parent: StateVersion,
    ) -> ExecutionResult<BatchExecutionOutput>;
}
