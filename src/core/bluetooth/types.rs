//! Defines shared data structures for the Bluetooth module.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A central (e-reader) connected to the peripheral
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Hardware address, unique per central
    pub address: String,
    /// The advertised name of the central, if the platform reported one
    pub name: Option<String>,
}

impl Device {
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }

    /// The name shown to the user, falling back to the address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

/// Link state reported by the platform's connection callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// ATT status codes used when answering requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GattStatus {
    Success = 0x00,
    RequestNotSupported = 0x06,
    InvalidOffset = 0x07,
}

/// A write to a descriptor, as delivered by the platform
#[derive(Debug, Clone)]
pub struct DescriptorWriteRequest {
    pub device: Device,
    pub request_id: u32,
    pub descriptor: Uuid,
    pub response_needed: bool,
    pub offset: u16,
    pub value: Vec<u8>,
}

/// A read of a descriptor
#[derive(Debug, Clone)]
pub struct DescriptorReadRequest {
    pub device: Device,
    pub request_id: u32,
    pub descriptor: Uuid,
    pub offset: u16,
}

/// A read of a characteristic value
#[derive(Debug, Clone)]
pub struct CharacteristicReadRequest {
    pub device: Device,
    pub request_id: u32,
    pub characteristic: Uuid,
    pub offset: u16,
}

/// Advertising interval preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvertiseMode {
    LowPower,
    Balanced,
    LowLatency,
}

/// Advertising transmit power preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

/// Radio-level advertising parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiseSettings {
    pub mode: AdvertiseMode,
    pub tx_power: TxPowerLevel,
    pub connectable: bool,
}

/// Advertising payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertiseData {
    pub include_device_name: bool,
    /// Name to advertise; `None` uses the adapter's own name
    pub device_name: Option<String>,
    pub service_uuids: Vec<Uuid>,
}

/// Lifecycle of the advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdvertisingState {
    /// Never started
    Idle,
    /// Accepted by the platform, waiting for the start callback
    Starting,
    Advertising,
    /// The platform reported a start failure after accepting the request
    Failed(i32),
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattDescriptor {
    pub uuid: Uuid,
    pub readable: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattCharacteristic {
    pub uuid: Uuid,
    pub read: bool,
    pub notify: bool,
    /// Initial value published with the characteristic
    pub value: Vec<u8>,
    pub descriptors: Vec<GattDescriptor>,
}

/// A primary service definition handed to the platform for registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GattService {
    pub uuid: Uuid,
    pub characteristics: Vec<GattCharacteristic>,
}

impl GattService {
    pub fn characteristic(&self, uuid: Uuid) -> Option<&GattCharacteristic> {
        self.characteristics.iter().find(|c| c.uuid == uuid)
    }
}

/// Lifecycle events emitted by the peripheral task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    Connected { address: String, name: String },
    Disconnected { address: String, name: String },
    /// The disconnected device was the selected target
    TargetLost { address: String },
    SubscriptionChanged { address: String, subscribed: bool },
    AdvertisingStarted,
    /// Advertising was rejected after `start` had already returned
    AdvertisingFailed { code: i32 },
    /// A scheduled report could not be delivered
    NotifyFailed { address: String, reason: String },
}
