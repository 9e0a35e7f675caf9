//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Wire services over the in-memory adapters
//! 3. Start the chain event observer
//! 4. Create the chain from the genesis transactions
//! 5. Accept blocks until shutdown

use crate::config::NodeConfig;
use crate::genesis::GenesisBuilder;
use crate::observer::{self, ObservedEvents};
use crate::wiring::NodeServices;
use anyhow::{Context, Result};
use kc_05_chain_manager::{AttachOutcome, BlockAttachApi, ChainCreationApi};
use shared_types::{short_hex, Block, Chain, Transaction};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct NodeRuntime {
    config: NodeConfig,
    services: NodeServices,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    observer: Mutex<Option<JoinHandle<ObservedEvents>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("invalid node configuration")?;
        let services = NodeServices::build(&config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            services,
            shutdown_tx,
            shutdown_rx,
            observer: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn services(&self) -> &NodeServices {
        &self.services
    }

    /// Start the observer and create the chain from the configured genesis.
    pub async fn start(&self) -> Result<Chain> {
        let genesis = GenesisBuilder::from_config(&self.config)
            .build()
            .context("failed to build genesis transactions")?;
        self.start_with_genesis(genesis).await
    }

    pub async fn start_with_genesis(&self, genesis_transactions: Vec<Transaction>) -> Result<Chain> {
        info!("===========================================");
        info!("  Kernel Chain Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        {
            let mut observer = self.observer.lock().await;
            if observer.is_none() {
                *observer = Some(observer::spawn(
                    &self.services.event_bus,
                    self.shutdown_rx.clone(),
                ));
            }
        }

        let chain = self
            .services
            .creation
            .create_new_chain(genesis_transactions)
            .await
            .context("failed to create chain")?;

        info!(
            chain_id = chain.id,
            genesis = %short_hex(&chain.genesis_block_hash),
            "Node started"
        );
        Ok(chain)
    }

    /// Hand a received block to the chain manager.
    pub async fn attach_block(&self, block: Block) -> Result<AttachOutcome> {
        let hash = block.hash();
        let height = block.height();
        self.services
            .attach
            .attach_block(block)
            .await
            .with_context(|| format!("failed to attach block {} at {height}", short_hex(&hash)))
    }

    pub fn best_chain(&self) -> Option<Chain> {
        self.services.chain_manager.get_chain()
    }

    /// Signal shutdown and wait for the observer to drain.
    pub async fn shutdown(&self) -> Option<ObservedEvents> {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            warn!("Shutdown signal had no receivers: {}", e);
        }

        let handle = self.observer.lock().await.take()?;
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(observed)) => {
                info!(
                    accepted = observed.accepted,
                    rejected = observed.rejected,
                    best_chain_updates = observed.best_chain_updates,
                    "Shutdown complete"
                );
                Some(observed)
            }
            Ok(Err(e)) => {
                error!("Event observer failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Event observer did not stop in time");
                None
            }
        }
    }
}
