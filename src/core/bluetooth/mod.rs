//! Bluetooth functionality for the page turner
//! This module handles the peripheral side of HID-over-GATT: advertising,
//! hosting the HID service, tracking connected centrals and dispatching key
//! reports to the selected one.

mod advertiser;
pub mod constants;
mod error;
mod gatt;
mod manager;
mod platform;
mod registry;
mod types;

// Re-export types that should be publicly accessible
pub use advertiser::AdvertisingController;
pub use constants::*; // Re-export all constants
pub use error::{
    AdvertisingError, GattError, InitError, NotifyError, PeripheralError, PlatformError,
    SendError, TargetError,
};
pub use gatt::{hid_service, ConnectionTransition, GattServiceHost};
pub use manager::Peripheral;
pub use platform::{AdvertiseCallbacks, BlePlatform, GattServerCallbacks};
pub use registry::ConnectionRegistry;
pub use types::{
    AdvertiseData, AdvertiseMode, AdvertiseSettings, AdvertisingState, CharacteristicReadRequest,
    ConnectionState, DescriptorReadRequest, DescriptorWriteRequest, Device, GattCharacteristic,
    GattDescriptor, GattService, GattStatus, PeripheralEvent, TxPowerLevel,
};
