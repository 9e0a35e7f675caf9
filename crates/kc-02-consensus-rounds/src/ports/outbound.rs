//! Driven ports (Outbound dependencies)

use kc_01_state_storage::StateVersion;

/// Time source for slot arithmetic
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in milliseconds
    fn now_ms(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Which state version "current" round data is read from.
///
/// The chain manager answers with its best chain tip.
pub trait CurrentStateVersion: Send + Sync {
    fn current_state_version(&self) -> StateVersion;
}
