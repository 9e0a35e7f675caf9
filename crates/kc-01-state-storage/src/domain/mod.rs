pub mod delta;
pub mod errors;
pub mod version;

pub use delta::StateDelta;
pub use errors::{StateStoreError, StateStoreResult};
pub use version::StateVersion;
