//! # Integration Scenarios
//!
//! Full node wiring, several nodes where blocks travel between them.

pub mod attachment;
pub mod execution;
pub mod replay;
pub mod rounds;
