//! Subscriber setup and structured log macros.
//!
//! JSON output carries the same fields as the pretty output, so block logs
//! can be filtered by `block_height` or `block_hash` after shipping.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log filter {:?}: {e}", config.log_level)))?;

    // At most one of the two output layers is active
    let (json, pretty) = match (config.console_output, config.json_logs) {
        (false, _) => (None, None),
        (true, true) => (
            Some(
                fmt::layer()
                    .json()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        (true, false) => (None, Some(fmt::layer().with_target(true).with_ansi(true))),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(pretty)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        console = config.console_output,
        "Logging initialized"
    );
    Ok(())
}

/// Block-scoped log line with `component`, `block_height` and `block_hash`
/// fields, plus any extra `key = value` pairs.
///
/// ```rust,ignore
/// log_block_event!(info, "chain", "Best chain advanced", height, short_hex(&hash));
/// ```
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $component:expr, $msg:expr, $height:expr, $hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            block_height = $height,
            block_hash = %$hash,
            $($($field)*,)?
            $msg
        )
    };
}
