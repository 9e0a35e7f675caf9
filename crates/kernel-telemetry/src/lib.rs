//! # Kernel Telemetry
//!
//! Structured logging for the kernel node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KC_SERVICE_NAME` | `kernel-chain` | Service name in logs |
//! | `KC_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `KC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `KC_JSON_LOGS` | `false` | JSON lines instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install subscriber: {0}")]
    Init(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
