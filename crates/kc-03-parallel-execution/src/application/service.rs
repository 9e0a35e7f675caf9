//! Parallel Execution Coordinator
//!
//! Main service implementing ParallelExecutionApi.

use crate::adapters::TieredStateView;
use crate::algorithms::{build_dependency_graph, conflict_detector, kahns_topological_sort, stamp_header};
use crate::config::ExecutionConfig;
use crate::domain::entities::{
    AnnotatedTransaction, BatchExecutionOutput, ExecutionContext, ExecutionSchedule,
    TransactionTrace,
};
use crate::domain::errors::{ExecutionError, ExecutionResult};
use crate::domain::invariants::{invariant_completeness, invariant_topological_order};
use crate::domain::value_objects::ExecutionMode;
use crate::ports::inbound::ParallelExecutionApi;
use crate::ports::outbound::{AccessPatternAnalyzer, TransactionExecutor};
use async_trait::async_trait;
use futures::future::join_all;
use kc_01_state_storage::{StateDelta, StateStore, StateStoreResult, StateVersion};
use shared_types::{
    short_hex, Block, BlockHeader, Bloom, Transaction, TransactionResult, TransactionResultStatus,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parallel Execution Coordinator
///
/// Orchestrates one batch:
/// 1. Validate input
/// 2. Analyze access patterns
/// 3. Check conflict threshold
/// 4. Build the dependency graph and run Kahn's algorithm
/// 5. Execute wave by wave, merging writes between waves
/// 6. Stamp the header with the resulting commitments
pub struct ParallelExecutionCoordinator {
    analyzer: Arc<dyn AccessPatternAnalyzer>,
    executor: Arc<dyn TransactionExecutor>,
    state_store: Arc<dyn StateStore>,
    config: ExecutionConfig,
}

/// Per-transaction output of one schedule run, in block order
type Traces = Vec<TransactionTrace>;

impl ParallelExecutionCoordinator {
    pub fn new(
        analyzer: Arc<dyn AccessPatternAnalyzer>,
        executor: Arc<dyn TransactionExecutor>,
        state_store: Arc<dyn StateStore>,
    ) -> Self {
        Self::with_config(analyzer, executor, state_store, ExecutionConfig::default())
    }

    pub fn with_config(
        analyzer: Arc<dyn AccessPatternAnalyzer>,
        executor: Arc<dyn TransactionExecutor>,
        state_store: Arc<dyn StateStore>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            analyzer,
            executor,
            state_store,
            config,
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    fn validate_batch(&self, transactions: &[Transaction]) -> ExecutionResult<()> {
        if transactions.len() > self.config.max_batch_size {
            return Err(ExecutionError::BatchTooLarge {
                size: transactions.len(),
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    /// Annotate every transaction, `None` if any pattern is unknown.
    async fn annotate(&self, transactions: &[Transaction]) -> Option<Vec<AnnotatedTransaction>> {
        let mut annotated = Vec::with_capacity(transactions.len());
        for (index, tx) in transactions.iter().enumerate() {
            match self.analyzer.analyze(tx).await {
                Ok(pattern) => {
                    annotated.push(AnnotatedTransaction::new(index, tx.hash(), tx.from, pattern))
                }
                Err(e) => {
                    debug!(index, error = %e, "Access pattern unavailable");
                    return None;
                }
            }
        }
        Some(annotated)
    }

    /// Parallel schedule for the batch, or `None` to run it sequentially.
    async fn plan(
        &self,
        transactions: &[Transaction],
    ) -> ExecutionResult<Option<(ExecutionSchedule, Vec<AnnotatedTransaction>)>> {
        if !self.config.enable_parallel || transactions.len() < 2 {
            return Ok(None);
        }

        let Some(annotated) = self.annotate(transactions).await else {
            warn!(
                tx_count = transactions.len(),
                "Access patterns incomplete, falling back to sequential"
            );
            return Ok(None);
        };

        let conflicts = conflict_detector::detect_conflicts(&annotated);
        let percent = conflict_detector::conflict_percentage(&conflicts, annotated.len());
        debug!(conflict_count = conflicts.len(), conflict_percent = percent, "Detected conflicts");
        if percent > self.config.conflict_threshold_percent {
            warn!(
                conflict_percent = percent,
                threshold = self.config.conflict_threshold_percent,
                "Conflict threshold exceeded, falling back to sequential"
            );
            return Ok(None);
        }

        let graph = build_dependency_graph(annotated.clone());
        if graph.edge_count() > self.config.max_edge_count {
            warn!(
                edge_count = graph.edge_count(),
                max = self.config.max_edge_count,
                "Dependency graph too large, falling back to sequential"
            );
            return Ok(None);
        }

        let schedule = kahns_topological_sort(&graph)?;
        debug_assert!(invariant_topological_order(&schedule, &graph));
        debug_assert!(invariant_completeness(&schedule, &graph));
        Ok(Some((schedule, annotated)))
    }

    /// Run one transaction against `overlay` on top of `parent`.
    async fn execute_one(
        executor: Arc<dyn TransactionExecutor>,
        store: Arc<dyn StateStore>,
        parent: StateVersion,
        overlay: Arc<StateDelta>,
        context: ExecutionContext,
        transaction: Transaction,
    ) -> (StateStoreResult<TransactionTrace>, BTreeSet<shared_types::StateKey>) {
        let view = TieredStateView::new(store, parent, overlay);
        let trace = executor.execute(&context, &transaction, &view).await;
        (trace, view.into_reads())
    }

    /// Execute `schedule` wave by wave.
    ///
    /// Returns `Ok(None)` when a transaction touched a key outside its
    /// declared pattern.
    async fn run_parallel(
        &self,
        schedule: &ExecutionSchedule,
        annotated: &[AnnotatedTransaction],
        transactions: &[Transaction],
        context: &ExecutionContext,
        parent: StateVersion,
    ) -> ExecutionResult<Option<(Traces, StateDelta)>> {
        let mut overlay = Arc::new(StateDelta::new());
        let mut traces: Vec<Option<TransactionTrace>> = vec![None; transactions.len()];

        for wave in &schedule.waves {
            let handles: Vec<_> = wave
                .indices
                .iter()
                .map(|&index| {
                    tokio::spawn(Self::execute_one(
                        self.executor.clone(),
                        self.state_store.clone(),
                        parent,
                        overlay.clone(),
                        context.clone(),
                        transactions[index].clone(),
                    ))
                })
                .collect();

            let outputs = join_all(handles).await;

            let mut wave_writes = Vec::with_capacity(outputs.len());
            for (&index, output) in wave.indices.iter().zip(outputs) {
                let (trace, reads) = output.map_err(|e| ExecutionError::TaskFailed(e.to_string()))?;
                let trace = trace?;

                let written: BTreeSet<_> = if trace.is_success() {
                    trace.writes.keys().cloned().collect()
                } else {
                    BTreeSet::new()
                };
                if !annotated[index].access_pattern.covers(&reads, &written) {
                    warn!(
                        index,
                        tx = %short_hex(&annotated[index].id),
                        "Transaction accessed undeclared state, re-running batch sequentially"
                    );
                    return Ok(None);
                }

                if trace.is_success() {
                    wave_writes.push(trace.writes.clone());
                }
                traces[index] = Some(trace);
            }

            // Wave members are index-sorted, so later writes win as in block order
            let merged = Arc::make_mut(&mut overlay);
            for writes in wave_writes {
                merged.merge(writes);
            }
        }

        let traces = traces.into_iter().flatten().collect::<Vec<_>>();
        if traces.len() != transactions.len() {
            return Err(ExecutionError::TaskFailed("schedule did not cover the batch".into()));
        }
        Ok(Some((traces, Arc::unwrap_or_clone(overlay))))
    }

    /// Execute in declared order, one transaction after the other.
    async fn run_sequential(
        &self,
        transactions: &[Transaction],
        context: &ExecutionContext,
        parent: StateVersion,
    ) -> ExecutionResult<(Traces, StateDelta)> {
        let mut overlay = Arc::new(StateDelta::new());
        let mut traces = Vec::with_capacity(transactions.len());

        for tx in transactions {
            let (trace, _) = Self::execute_one(
                self.executor.clone(),
                self.state_store.clone(),
                parent,
                overlay.clone(),
                context.clone(),
                tx.clone(),
            )
            .await;
            let trace = trace?;
            if trace.is_success() {
                Arc::make_mut(&mut overlay).merge(trace.writes.clone());
            }
            traces.push(trace);
        }

        Ok((traces, Arc::unwrap_or_clone(overlay)))
    }

    fn to_result(header: &BlockHeader, transaction: &Transaction, trace: TransactionTrace) -> TransactionResult {
        let mut bloom = Bloom::default();
        for log in &trace.logs {
            bloom.accrue_bloom(&log.bloom());
        }
        let (status, error) = match trace.fault {
            None => (TransactionResultStatus::Mined, None),
            Some(fault) => (TransactionResultStatus::Failed, Some(fault.0)),
        };
        TransactionResult {
            transaction_id: transaction.hash(),
            block_hash: shared_types::EMPTY_HASH,
            block_number: header.height,
            status,
            return_value: trace.return_value,
            logs: trace.logs,
            bloom,
            error,
        }
    }
}

#[async_trait]
impl ParallelExecutionApi for ParallelExecutionCoordinator {
    async fn execute_batch(
        &self,
        header: &BlockHeader,
        transactions: &[Transaction],
        parent: StateVersion,
    ) -> ExecutionResult<BatchExecutionOutput> {
        self.validate_batch(transactions)?;

        let context = ExecutionContext {
            block_height: header.height,
            block_timestamp: header.timestamp,
            producer: header.producer,
            previous_block_hash: header.previous_block_hash,
        };

        let mut outcome = None;
        if let Some((schedule, annotated)) = self.plan(transactions).await? {
            if let Some((traces, delta)) = self
                .run_parallel(&schedule, &annotated, transactions, &context, parent)
                .await?
            {
                outcome = Some((traces, delta, schedule, ExecutionMode::Parallel));
            }
        }
        let (traces, merged_delta, schedule, mode) = match outcome {
            Some(outcome) => outcome,
            None => {
                let (traces, delta) = self.run_sequential(transactions, &context, parent).await?;
                (
                    traces,
                    delta,
                    ExecutionSchedule::in_block_order(transactions.len()),
                    ExecutionMode::Sequential,
                )
            }
        };

        let mut transaction_results: Vec<TransactionResult> = transactions
            .iter()
            .zip(traces)
            .map(|(tx, trace)| Self::to_result(header, tx, trace))
            .collect();

        let transaction_ids: Vec<_> = transactions.iter().map(|tx| tx.hash()).collect();
        let stamped = stamp_header(
            header,
            &transaction_ids,
            &transaction_results,
            &merged_delta,
            self.config.parallel_hash_threshold,
        );
        let block = Block::new(stamped, transaction_ids);
        let block_hash = block.hash();
        for result in &mut transaction_results {
            result.block_hash = block_hash;
        }

        info!(
            block_height = header.height,
            block_hash = %short_hex(&block_hash),
            tx_count = transactions.len(),
            waves = schedule.waves.len(),
            width = schedule.width(),
            mode = ?mode,
            "Batch executed"
        );

        Ok(BatchExecutionOutput {
            block,
            transaction_results,
            merged_delta,
            schedule,
            mode,
        })
    }
}
