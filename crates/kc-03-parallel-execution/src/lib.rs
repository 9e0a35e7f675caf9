//! # KC-03: Parallel Execution Coordinator
//!
//! Executes the transactions of one block concurrently where it is safe and
//! returns the results, the merged state delta and the block re-stamped
//! with its execution commitments.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (AnnotatedTransaction, DependencyGraph, ExecutionSchedule)
//! - **Algorithms**: Kahn's sort, dependency building, conflict detection, header roots
//! - **Ports**: Inbound (ParallelExecutionApi) and Outbound (AccessPatternAnalyzer,
//!   TransactionExecutor, StateReader)
//! - **Adapters**: Declared access registry, tiered state view
//! - **Application**: Coordinator orchestration
//!
//! ## Ordering Guarantee
//!
//! Dependency edges always point from the earlier to the later transaction
//! in block order. Every level of Kahn's sort becomes a wave that runs
//! concurrently, and a wave only starts once the writes of all previous
//! waves are merged. The outcome for every key equals executing the block
//! sequentially in declared order.
//!
//! When the analysis is missing, the conflict ratio is too high, or a
//! transaction touches a key it did not declare, the batch runs
//! sequentially instead.

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{DeclaredAccessAnalyzer, TieredStateView};
pub use application::service::ParallelExecutionCoordinator;
pub use config::ExecutionConfig;
pub use domain::entities::*;
pub use domain::errors::{AnalysisError, ExecutionError, ExecutionResult};
pub use domain::value_objects::*;
pub use ports::inbound::ParallelExecutionApi;
pub use ports::outbound::{AccessPatternAnalyzer, StateReader, TransactionExecutor};
