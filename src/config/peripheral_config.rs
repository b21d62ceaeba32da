use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::bluetooth::constants::{CONFIG_FILE_NAME, DEFAULT_COMMAND_QUEUE_CAPACITY};
use crate::core::bluetooth::{AdvertiseMode, TxPowerLevel};
use crate::utils::ensure_directory_exists;

/// Settings for the HID peripheral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Name advertised to centrals. `None` keeps the system's adapter name.
    pub device_name: Option<String>,
    /// Advertising interval preset
    pub advertise_mode: AdvertiseMode,
    /// Advertising transmit power
    pub tx_power: TxPowerLevel,
    /// Whether centrals may connect to the advertisement
    pub connectable: bool,
    /// Whether the device name is part of the advertising payload
    pub include_device_name: bool,
    /// Number of commands that may wait for the peripheral task
    pub command_queue_capacity: usize,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        PeripheralConfig {
            device_name: None,
            advertise_mode: AdvertiseMode::LowLatency,
            tx_power: TxPowerLevel::High,
            connectable: true,
            include_device_name: true,
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl PeripheralConfig {
    /// Loads the config from `config_dir`, falling back to defaults when the
    /// file does not exist.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!(
                "Config file not found at {:?}, using default.",
                file_path_str
            );
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(&file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config into `config_dir`.
    pub async fn save_config(&self, config_dir: &Path) -> Result<()> {
        ensure_directory_exists(config_dir).await?;

        let file_path = config_dir.join(CONFIG_FILE_NAME);
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize peripheral config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(&file_path, config_json).await?;

        info!("Peripheral config saved to {:?}.", file_path_str);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PeripheralConfig::load_config(dir.path()).await.unwrap();
        assert_eq!(config, PeripheralConfig::default());
        assert_eq!(config.advertise_mode, AdvertiseMode::LowLatency);
        assert_eq!(config.tx_power, TxPowerLevel::High);
        assert!(config.connectable);
    }

    #[tokio::test]
    async fn save_then_load_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("page-turner").join("settings");
        let config = PeripheralConfig {
            device_name: Some("Page Turner".to_string()),
            tx_power: TxPowerLevel::Medium,
            ..PeripheralConfig::default()
        };
        config.save_config(&nested).await.unwrap();

        let loaded = PeripheralConfig::load_config(&nested).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "advertise_mode": "Balanced" }"#,
        )
        .unwrap();

        let config = PeripheralConfig::load_config(dir.path()).await.unwrap();
        assert_eq!(config.advertise_mode, AdvertiseMode::Balanced);
        assert_eq!(config.command_queue_capacity, DEFAULT_COMMAND_QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "not json").unwrap();
        assert!(PeripheralConfig::load_config(dir.path()).await.is_err());
    }
}
