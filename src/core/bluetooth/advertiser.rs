//! Advertising lifecycle for the HID peripheral
//! Starts and stops the advertisement and tracks the late result reported
//! by the radio stack.

use std::sync::Arc;

use log::{error, info, warn};

use crate::config::peripheral_config::PeripheralConfig;
use crate::core::bluetooth::constants::UUID_HID_SERVICE;
use crate::core::bluetooth::error::{AdvertisingError, PlatformError};
use crate::core::bluetooth::platform::{AdvertiseCallbacks, BlePlatform};
use crate::core::bluetooth::types::{AdvertiseData, AdvertiseSettings, AdvertisingState};

/// Owns the advertisement on behalf of the peripheral task
pub struct AdvertisingController {
    platform: Arc<dyn BlePlatform>,
    callbacks: AdvertiseCallbacks,
    settings: AdvertiseSettings,
    data: AdvertiseData,
    state: AdvertisingState,
}

impl AdvertisingController {
    pub fn new(
        platform: Arc<dyn BlePlatform>,
        callbacks: AdvertiseCallbacks,
        config: &PeripheralConfig,
    ) -> Self {
        let settings = AdvertiseSettings {
            mode: config.advertise_mode,
            tx_power: config.tx_power,
            connectable: config.connectable,
        };
        let data = AdvertiseData {
            include_device_name: config.include_device_name,
            device_name: config.device_name.clone(),
            service_uuids: vec![UUID_HID_SERVICE],
        };
        Self {
            platform,
            callbacks,
            settings,
            data,
            state: AdvertisingState::Idle,
        }
    }

    pub fn state(&self) -> AdvertisingState {
        self.state
    }

    pub fn settings(&self) -> &AdvertiseSettings {
        &self.settings
    }

    pub fn data(&self) -> &AdvertiseData {
        &self.data
    }

    /// Starts advertising the HID service.
    ///
    /// Returns once the platform has accepted the request; a rejection that
    /// arrives later is reported through `on_start_failure`.
    pub async fn start(&mut self) -> Result<(), AdvertisingError> {
        if matches!(
            self.state,
            AdvertisingState::Starting | AdvertisingState::Advertising
        ) {
            info!("Already advertising.");
            return Ok(());
        }

        if !self.platform.has_advertiser() {
            error!("Failed to create advertiser");
            return Err(AdvertisingError::AdvertiserUnavailable);
        }

        match self
            .platform
            .start_advertising(&self.settings, &self.data, self.callbacks.clone())
            .await
        {
            Ok(()) => {
                self.state = AdvertisingState::Starting;
                info!("Advertising requested with {:?}", self.settings);
                Ok(())
            }
            Err(PlatformError::Unavailable) => {
                error!("Advertiser disappeared before advertising could start");
                Err(AdvertisingError::AdvertiserUnavailable)
            }
            Err(PlatformError::Rejected(code)) => {
                error!("Advertising rejected with error code: {}", code);
                self.state = AdvertisingState::Failed(code);
                Err(AdvertisingError::AdvertiseStartFailed(code))
            }
            Err(e) => {
                error!("Advertising failed to start: {}", e);
                self.state = AdvertisingState::Failed(-1);
                Err(AdvertisingError::AdvertiseStartFailed(-1))
            }
        }
    }

    /// Stops advertising. Calling this when not advertising does nothing.
    pub async fn stop(&mut self) {
        match self.state {
            AdvertisingState::Starting | AdvertisingState::Advertising => {
                self.platform.stop_advertising().await;
                self.state = AdvertisingState::Stopped;
                info!("Advertising stopped.");
            }
            _ => info!("Advertising not active, nothing to stop."),
        }
    }

    /// Applies the platform's success callback. Returns `true` if advertising
    /// is now live.
    pub fn on_start_success(&mut self) -> bool {
        if self.state == AdvertisingState::Starting {
            self.state = AdvertisingState::Advertising;
            info!("Advertising successfully started");
            true
        } else {
            // stop() already ran; the platform was told to stop
            warn!("Ignoring advertise success in state {:?}", self.state);
            false
        }
    }

    /// Applies the platform's failure callback. Returns `true` if the failure
    /// concerns the current start attempt and should be surfaced.
    pub fn on_start_failure(&mut self, code: i32) -> bool {
        if self.state == AdvertisingState::Starting {
            error!("Advertising failed with error code: {}", code);
            self.state = AdvertisingState::Failed(code);
            true
        } else {
            warn!(
                "Ignoring advertise failure {} in state {:?}",
                code, self.state
            );
            false
        }
    }
}
