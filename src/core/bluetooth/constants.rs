//! Constants used throughout the peripheral
//! This module contains the fixed HID-over-GATT identifiers, descriptor values,
//! timings and other configuration values.

use uuid::Uuid;

/// Standard Bluetooth Service UUIDs
pub const UUID_HID_SERVICE: Uuid = Uuid::from_u128(0x00001812_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_REPORT_MAP: Uuid = Uuid::from_u128(0x00002a4b_0000_1000_8000_00805f9b34fb);
pub const UUID_REPORT: Uuid = Uuid::from_u128(0x00002a4d_0000_1000_8000_00805f9b34fb);

/// Client Characteristic Configuration Descriptor
pub const UUID_CCCD: Uuid = Uuid::from_u128(0x00002902_0000_1000_8000_00805f9b34fb);

/// CCCD value written by a central to enable notifications
pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];

/// CCCD value written by a central to enable indications
pub const ENABLE_INDICATION_VALUE: [u8; 2] = [0x02, 0x00];

/// CCCD value written by a central to disable notifications and indications
pub const DISABLE_NOTIFICATION_VALUE: [u8; 2] = [0x00, 0x00];

/// Delay between a key press notification returning and its release, in milliseconds
pub const KEY_RELEASE_DELAY_MS: u64 = 50;

/// Default capacity of the command queue feeding the peripheral task
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 32;

/// Name of the configuration file stored in the application config directory
pub const CONFIG_FILE_NAME: &str = "peripheral_config.json";
