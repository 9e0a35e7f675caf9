use super::StateVersion;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateStoreError {
    #[error("State store unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown state version {0}")]
    UnknownVersion(StateVersion),

    #[error("State version {0} is sealed")]
    VersionSealed(StateVersion),

    #[error("State version {0} already committed")]
    VersionExists(StateVersion),

    #[error("Lock poisoned")]
    LockPoisoned,
}

pub type StateStoreResult<T> = Result<T, StateStoreError>;
