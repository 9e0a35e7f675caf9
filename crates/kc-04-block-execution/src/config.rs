//! Pipeline configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How far ahead of local time a block timestamp may be before the block
    /// is deferred (ms)
    pub max_future_drift_ms: u64,
    /// Upper bound on transactions in one block
    pub max_transactions_per_block: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_future_drift_ms: 4_000,
            max_transactions_per_block: 1_000,
        }
    }
}
