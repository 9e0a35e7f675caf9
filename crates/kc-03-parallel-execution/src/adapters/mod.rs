//! Adapters for parallel execution

pub mod declared_access;
pub mod tiered_state;

pub use declared_access::DeclaredAccessAnalyzer;
pub use tiered_state::TieredStateView;
