//! Algorithms for parallel execution
//!
//! - Dependency graph construction
//! - Kahn levels: the schedule as waves of independent transactions
//! - Conflict detection for the sequential fallback
//! - Header commitments over the executed batch

pub mod conflict_detector;
pub mod dependency_builder;
pub mod kahns;
pub mod roots;

pub use conflict_detector::{conflict_percentage, detect_conflicts};
pub use dependency_builder::build_dependency_graph;
pub use kahns::kahns_topological_sort;
pub use roots::stamp_header;
