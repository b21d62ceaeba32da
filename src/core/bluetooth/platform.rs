//! Platform radio abstraction
//! The peripheral never talks to an OS Bluetooth API directly. The embedding
//! application implements `BlePlatform` and forwards its radio callbacks
//! through the `GattServerCallbacks` / `AdvertiseCallbacks` handles it is given.

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::bluetooth::error::PlatformError;
use crate::core::bluetooth::types::{
    AdvertiseData, AdvertiseSettings, CharacteristicReadRequest, ConnectionState,
    DescriptorReadRequest, DescriptorWriteRequest, Device, GattService, GattStatus,
};

/// Radio stack operations needed by the peripheral
#[async_trait]
pub trait BlePlatform: Send + Sync {
    /// Open a GATT server whose callbacks are delivered through `callbacks`.
    async fn open_gatt_server(&self, callbacks: GattServerCallbacks) -> Result<(), PlatformError>;

    /// Register a service on the open GATT server.
    async fn add_service(&self, service: &GattService) -> Result<(), PlatformError>;

    /// Whether the radio can currently produce an advertiser.
    fn has_advertiser(&self) -> bool;

    /// Begin advertising. Acceptance here does not mean advertising started;
    /// the outcome arrives later through `callbacks`.
    async fn start_advertising(
        &self,
        settings: &AdvertiseSettings,
        data: &AdvertiseData,
        callbacks: AdvertiseCallbacks,
    ) -> Result<(), PlatformError>;

    async fn stop_advertising(&self);

    /// Answer a read or write request from a central.
    async fn send_response(
        &self,
        address: &str,
        request_id: u32,
        status: GattStatus,
        offset: u16,
        value: &[u8],
    ) -> Result<(), PlatformError>;

    /// Push a characteristic value to one connected central.
    async fn notify_characteristic_changed(
        &self,
        address: &str,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
        confirm: bool,
    ) -> Result<(), PlatformError>;
}

/// Radio callbacks as seen by the peripheral task
#[derive(Debug, Clone)]
pub(crate) enum RadioEvent {
    ConnectionStateChanged {
        device: Device,
        state: ConnectionState,
    },
    DescriptorWrite(DescriptorWriteRequest),
    DescriptorRead(DescriptorReadRequest),
    CharacteristicRead(CharacteristicReadRequest),
    AdvertiseStartSucceeded,
    AdvertiseStartFailed {
        code: i32,
    },
}

/// Handle the platform uses to report GATT server callbacks.
///
/// Every method only queues the event, so it is safe to call from any
/// thread, including the radio stack's own callback thread.
#[derive(Debug, Clone)]
pub struct GattServerCallbacks {
    tx: mpsc::UnboundedSender<RadioEvent>,
}

impl GattServerCallbacks {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RadioEvent>) -> Self {
        Self { tx }
    }

    pub fn on_connection_state_change(&self, device: Device, state: ConnectionState) {
        self.post(RadioEvent::ConnectionStateChanged { device, state });
    }

    pub fn on_descriptor_write_request(&self, request: DescriptorWriteRequest) {
        self.post(RadioEvent::DescriptorWrite(request));
    }

    pub fn on_descriptor_read_request(&self, request: DescriptorReadRequest) {
        self.post(RadioEvent::DescriptorRead(request));
    }

    pub fn on_characteristic_read_request(&self, request: CharacteristicReadRequest) {
        self.post(RadioEvent::CharacteristicRead(request));
    }

    fn post(&self, event: RadioEvent) {
        if self.tx.send(event).is_err() {
            debug!("Peripheral task gone, dropping GATT callback");
        }
    }
}

/// Handle the platform uses to report the outcome of `start_advertising`.
#[derive(Debug, Clone)]
pub struct AdvertiseCallbacks {
    tx: mpsc::UnboundedSender<RadioEvent>,
}

impl AdvertiseCallbacks {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RadioEvent>) -> Self {
        Self { tx }
    }

    pub fn on_start_success(&self) {
        if self.tx.send(RadioEvent::AdvertiseStartSucceeded).is_err() {
            debug!("Peripheral task gone, dropping advertise result");
        }
    }

    pub fn on_start_failure(&self, code: i32) {
        if self.tx.send(RadioEvent::AdvertiseStartFailed { code }).is_err() {
            debug!("Peripheral task gone, dropping advertise failure {}", code);
        }
    }
}
