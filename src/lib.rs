//! Page Turner peripheral library
//! Turns a host with a BLE peripheral radio into a HID keyboard that sends
//! page-turn keys to a connected e-reader.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod emitter;
pub mod logging;
pub mod state;
pub mod utils;

pub use crate::core::bluetooth::{BlePlatform, Peripheral, PeripheralError, PeripheralEvent};
pub use crate::core::hid::{KeyboardReport, PageTurn};
pub use emitter::EventEmitter;
pub use state::AppState;
