//! Application state management
//! The peripheral context is built once at startup and handed to the
//! command layer; nothing here is global.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::commands::forward_events;
use crate::config::peripheral_config::PeripheralConfig;
use crate::config::AppConfig;
use crate::core::bluetooth::{BlePlatform, Peripheral};
use crate::emitter::EventEmitter;

/// Application state shared by the commands
pub struct AppState {
    /// Handle to the peripheral task
    pub peripheral: Peripheral,
    pub config: AppConfig,
}

impl AppState {
    /// Loads the configuration from `config_dir` and starts the peripheral task.
    pub async fn new(
        platform: Arc<dyn BlePlatform>,
        config_dir: &Path,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<Self> {
        let config = AppConfig {
            peripheral: PeripheralConfig::load_config(config_dir).await?,
        };
        Ok(Self::with_config(platform, config, emitter))
    }

    /// Starts the peripheral task with an explicit configuration.
    pub fn with_config(
        platform: Arc<dyn BlePlatform>,
        config: AppConfig,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        info!("Initializing peripheral...");
        let (peripheral, events) = Peripheral::new(platform, config.peripheral.clone());
        tokio::spawn(forward_events(events, emitter));
        Self { peripheral, config }
    }
}
