//! Post-execution checks: declared state root and result accounting

use crate::domain::{BlockProcessingStage, RejectReason, StageError};
use crate::ports::BlockValidationProvider;
use async_trait::async_trait;
use shared_types::{short_hex, Block, BlockExecutedSet};

#[derive(Default)]
pub struct ExecutionResultValidationProvider;

impl ExecutionResultValidationProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlockValidationProvider for ExecutionResultValidationProvider {
    fn name(&self) -> &'static str {
        "execution-result"
    }

    async fn validate_after_execute(
        &self,
        block: &Block,
        executed: &BlockExecutedSet,
    ) -> Result<(), StageError> {
        let declared = block.header.merkle_tree_root_of_world_state;
        let computed = executed.block.header.merkle_tree_root_of_world_state;
        if declared != computed {
            return Err(RejectReason::mismatch(
                BlockProcessingStage::ValidatingPost,
                format!(
                    "world state root {} does not match computed {}",
                    short_hex(&declared),
                    short_hex(&computed)
                ),
            )
            .into());
        }

        let expected = block.transaction_ids().len();
        let produced = executed.transaction_result_map.len();
        if produced != expected {
            return Err(RejectReason::mismatch(
                BlockProcessingStage::ValidatingPost,
                format!("{produced} results for {expected} transactions"),
            )
            .into());
        }

        Ok(())
    }
}
