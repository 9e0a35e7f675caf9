//! Ports (outbound dependencies) of the scheduler

mod outbound;

pub use outbound::{CurrentStateVersion, SystemTimeSource, TimeSource};
