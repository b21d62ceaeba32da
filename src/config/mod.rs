pub mod peripheral_config;

use serde::{Deserialize, Serialize};

use crate::config::peripheral_config::PeripheralConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub peripheral: PeripheralConfig,
}
