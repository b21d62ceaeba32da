//! HID keyboard report handling
//! This module builds the fixed report descriptor and the 8-byte input reports
//! sent to the e-reader.

use serde::{Deserialize, Serialize};

/// Size of a keyboard input report in bytes
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// USB HID usage ID for Right Arrow
pub const KEY_RIGHT_ARROW: u8 = 0x4F;

/// USB HID usage ID for Left Arrow
pub const KEY_LEFT_ARROW: u8 = 0x50;

/// Report map for a generic keyboard: 8 modifier bits, 1 reserved byte,
/// 5 LED output bits plus padding and a 6-key array.
pub const REPORT_MAP: [u8; 63] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224)
    0x29, 0xE7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array)
    0xC0,       // End Collection
];

/// Returns the report descriptor published in the Report Map characteristic.
pub fn report_descriptor() -> &'static [u8] {
    &REPORT_MAP
}

/// A single keyboard input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    /// Modifier bitmask, unused by this profile
    pub modifier: u8,
    pub reserved: u8,
    /// Key array; only the first slot is ever populated
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Report with `key_code` held down
    pub const fn press(key_code: u8) -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [key_code, 0, 0, 0, 0, 0],
        }
    }

    /// Report with every key up
    pub const fn release() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    pub fn is_release(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Wire representation of the report
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut bytes = [0u8; KEYBOARD_REPORT_SIZE];
        bytes[0] = self.modifier;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keycodes);
        bytes
    }
}

/// Page-turn direction sent to the e-reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageTurn {
    /// Next page (Right Arrow)
    Next,
    /// Previous page (Left Arrow)
    Previous,
}

impl PageTurn {
    pub fn key_code(self) -> u8 {
        match self {
            Self::Next => KEY_RIGHT_ARROW,
            Self::Previous => KEY_LEFT_ARROW,
        }
    }

    /// Maps the "left" / "right" key signal used by the control panel.
    pub fn from_direction(direction: &str) -> Option<Self> {
        match direction.to_ascii_lowercase().as_str() {
            "right" | "next" => Some(Self::Next),
            "left" | "previous" => Some(Self::Previous),
            _ => None,
        }
    }
}
