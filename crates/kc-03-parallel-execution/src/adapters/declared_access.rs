//! Declared Access Analyzer Adapter
//!
//! Access patterns registered up front by whoever assembled the block.

use crate::domain::errors::AnalysisError;
use crate::domain::value_objects::AccessPattern;
use crate::ports::outbound::AccessPatternAnalyzer;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Hash, Transaction};
use std::collections::HashMap;
use tracing::trace;

/// Registry of access patterns keyed by transaction id.
///
/// A transaction that was never declared cannot be scheduled in parallel.
#[derive(Default)]
pub struct DeclaredAccessAnalyzer {
    patterns: RwLock<HashMap<Hash, AccessPattern>>,
}

impl DeclaredAccessAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&self, transaction_id: Hash, pattern: AccessPattern) {
        self.patterns.write().insert(transaction_id, pattern);
    }

    pub fn declare_for(&self, transaction: &Transaction, pattern: AccessPattern) {
        self.declare(transaction.hash(), pattern);
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }
}

#[async_trait]
impl AccessPatternAnalyzer for DeclaredAccessAnalyzer {
    async fn analyze(&self, transaction: &Transaction) -> Result<AccessPattern, AnalysisError> {
        let id = transaction.hash();
        let pattern = self.patterns.read().get(&id).cloned();
        match pattern {
            Some(pattern) => {
                trace!(
                    tx = %hex::encode(&id[..6]),
                    reads = pattern.reads.len(),
                    writes = pattern.writes.len(),
                    "Declared access pattern"
                );
                Ok(pattern)
            }
            None => Err(AnalysisError::Undeclared(hex::encode(id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::StateKey;

    #[tokio::test]
    async fn test_declared_pattern_is_returned() {
        let analyzer = DeclaredAccessAnalyzer::new();
        let tx = Transaction::new([1; 20], [2; 20], "Set", vec![1]);
        let pattern = AccessPattern::new().with_writes(vec![StateKey::new([2; 20], "a")]);
        analyzer.declare_for(&tx, pattern.clone());

        assert_eq!(analyzer.analyze(&tx).await.unwrap(), pattern);
        assert_eq!(analyzer.len(), 1);
    }

    #[tokio::test]
    async fn test_undeclared_transaction() {
        let analyzer = DeclaredAccessAnalyzer::new();
        let tx = Transaction::new([1; 20], [2; 20], "Set", vec![]);

        assert!(matches!(
            analyzer.analyze(&tx).await,
            Err(AnalysisError::Undeclared(_))
        ));
    }
}
