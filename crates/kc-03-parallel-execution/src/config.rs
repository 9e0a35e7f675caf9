//! Configuration for the parallel execution coordinator

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum transactions in one batch
    pub max_batch_size: usize,
    /// Maximum edges in dependency graph before running sequentially
    pub max_edge_count: usize,
    /// Fallback to sequential if conflicts exceed threshold
    pub conflict_threshold_percent: u8,
    /// Run groups concurrently at all
    pub enable_parallel: bool,
    /// Batch size from which result hashing uses rayon
    pub parallel_hash_threshold: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            max_edge_count: 10_000,
            conflict_threshold_percent: 50,
            enable_parallel: true,
            parallel_hash_threshold: 4,
        }
    }
}
