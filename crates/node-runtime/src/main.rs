//! # Kernel Chain Node
//!
//! Runs a single node over in-memory storage: creates the chain from the
//! configured genesis miners and keeps the chain services up until Ctrl+C.
//!
//! ## Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `KC_CONFIG_FILE` | JSON file with a full or partial `NodeConfig` |
//! | `KC_CHAIN_ID` | Chain id |
//! | `KC_GENESIS_TIMESTAMP` | Genesis header timestamp (ms) |
//! | `KC_MINER_ADDRESS` | This node's miner account (hex) |
//! | `KC_GENESIS_MINERS` | Comma separated miner list of the first round |
//! | `KC_MINING_INTERVAL_MS` | Slot length |
//! | `KC_PARALLEL_EXECUTION` | `false` runs every block sequentially |
//! | `KC_MAX_TXS_PER_BLOCK` | Block and batch size limit |
//!
//! Logging is configured through `KC_LOG_LEVEL` / `RUST_LOG` and
//! `KC_JSON_LOGS`.

use anyhow::{Context, Result};
use kernel_telemetry::init_logging;
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("failed to load configuration")?;
    init_logging(&config.telemetry).context("failed to initialize logging")?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
