//! # Node Configuration
//!
//! Unified configuration for every kernel service and the genesis miners.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. Per-crate defaults
//! 2. A JSON file named by `KC_CONFIG_FILE`
//! 3. Individual `KC_*` environment variables

use kc_02_consensus_rounds::ConsensusConfig;
use kc_03_parallel_execution::ExecutionConfig;
use kc_04_block_execution::PipelineConfig;
use kc_05_chain_manager::ChainConfig;
use kernel_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Failed to read config file {path}: {reason}")]
    File { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub chain: ChainConfig,
    pub pipeline: PipelineConfig,
    pub execution: ExecutionConfig,
    pub consensus: ConsensusConfig,
    pub telemetry: TelemetryConfig,
    /// Miner list written into the first round at genesis. Falls back to
    /// the local miner when empty.
    pub genesis_miners: Vec<Address>,
}

impl NodeConfig {
    /// Defaults, then `KC_CONFIG_FILE`, then environment overrides.
    /// Telemetry settings always come from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("KC_CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.telemetry = TelemetryConfig::from_env();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| file_error(e.to_string()))
    }

    /// Apply `KC_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("KC_CHAIN_ID") {
            self.chain.chain_id = parse_number("KC_CHAIN_ID", &value)?;
        }
        if let Some(value) = lookup("KC_GENESIS_TIMESTAMP") {
            self.chain.genesis_timestamp = parse_number("KC_GENESIS_TIMESTAMP", &value)?;
        }
        if let Some(value) = lookup("KC_MINING_INTERVAL_MS") {
            self.consensus.mining_interval_ms = parse_number("KC_MINING_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("KC_MINER_ADDRESS") {
            self.consensus.local_miner = Some(parse_address("KC_MINER_ADDRESS", &value)?);
        }
        if let Some(value) = lookup("KC_GENESIS_MINERS") {
            self.genesis_miners = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_address("KC_GENESIS_MINERS", s))
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup("KC_PARALLEL_EXECUTION") {
            self.execution.enable_parallel = parse_flag("KC_PARALLEL_EXECUTION", &value)?;
        }
        if let Some(value) = lookup("KC_MAX_TXS_PER_BLOCK") {
            let max: usize = parse_number("KC_MAX_TXS_PER_BLOCK", &value)?;
            self.pipeline.max_transactions_per_block = max;
            self.execution.max_batch_size = max;
        }
        Ok(())
    }

    /// Miners of the first round.
    pub fn initial_miners(&self) -> Vec<Address> {
        if self.genesis_miners.is_empty() {
            self.consensus.local_miner.into_iter().collect()
        } else {
            self.genesis_miners.clone()
        }
    }

    /// Reject combinations the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consensus.mining_interval_ms == 0 {
            return Err(ConfigError::Invalid("mining interval must be positive".into()));
        }
        if self.pipeline.max_transactions_per_block == 0 {
            return Err(ConfigError::Invalid(
                "max transactions per block must be positive".into(),
            ));
        }
        if self.execution.max_batch_size < self.pipeline.max_transactions_per_block {
            return Err(ConfigError::Invalid(format!(
                "execution batch size {} is below the block limit {}",
                self.execution.max_batch_size, self.pipeline.max_transactions_per_block
            )));
        }
        if self.execution.conflict_threshold_percent > 100 {
            return Err(ConfigError::Invalid(
                "conflict threshold is a percentage".into(),
            ));
        }

        let miners = self.initial_miners();
        if miners.is_empty() {
            return Err(ConfigError::Invalid(
                "no genesis miners: set KC_GENESIS_MINERS or KC_MINER_ADDRESS".into(),
            ));
        }
        let unique: HashSet<&Address> = miners.iter().collect();
        if unique.len() != miners.len() {
            return Err(ConfigError::Invalid("duplicate genesis miner".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            reason: e.to_string(),
        })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue { var, reason };
    let hex_str = value.trim().trim_start_matches("0x");
    let bytes = hex::decode(hex_str).map_err(|e| invalid(e.to_string()))?;
    Address::try_from(bytes.as_slice())
        .map_err(|_| invalid(format!("address must be 20 bytes, got {}", bytes.len())))
}
