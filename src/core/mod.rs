//! Core functionality for the page turner
//! This module contains the HID report handling and the BLE peripheral engine.

pub mod bluetooth;
pub mod hid;

// Re-export commonly used types
pub use bluetooth::{Peripheral, PeripheralEvent};
pub use hid::{KeyboardReport, PageTurn};
