//! Validation provider port

use crate::domain::StageError;
use async_trait::async_trait;
use shared_types::{Block, BlockExecutedSet};

/// One family of block checks.
///
/// Providers run in registration order; the first failure wins.
#[async_trait]
pub trait BlockValidationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Checks that need no execution output.
    async fn validate_before_execute(&self, _block: &Block) -> Result<(), StageError> {
        Ok(())
    }

    /// Checks against what executing `block` produced.
    async fn validate_after_execute(
        &self,
        _block: &Block,
        _executed: &BlockExecutedSet,
    ) -> Result<(), StageError> {
        Ok(())
    }
}
