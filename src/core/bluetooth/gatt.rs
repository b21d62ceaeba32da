//! HID-over-GATT service hosting
//! Publishes the HID service, answers read/write requests from centrals and
//! pushes report notifications to a single connected device.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::core::bluetooth::constants::{
    DISABLE_NOTIFICATION_VALUE, ENABLE_NOTIFICATION_VALUE, UUID_CCCD, UUID_HID_SERVICE,
    UUID_REPORT, UUID_REPORT_MAP,
};
use crate::core::bluetooth::error::{GattError, NotifyError};
use crate::core::bluetooth::platform::{BlePlatform, GattServerCallbacks};
use crate::core::bluetooth::registry::ConnectionRegistry;
use crate::core::bluetooth::types::{
    CharacteristicReadRequest, ConnectionState, DescriptorReadRequest, DescriptorWriteRequest,
    Device, GattCharacteristic, GattDescriptor, GattService, GattStatus,
};
use crate::core::hid::{report_descriptor, KeyboardReport, KEYBOARD_REPORT_SIZE};

/// Builds the HID service: Report Map (read) and Report (read + notify, with CCCD).
pub fn hid_service() -> GattService {
    GattService {
        uuid: UUID_HID_SERVICE,
        characteristics: vec![
            GattCharacteristic {
                uuid: UUID_REPORT_MAP,
                read: true,
                notify: false,
                value: report_descriptor().to_vec(),
                descriptors: Vec::new(),
            },
            GattCharacteristic {
                uuid: UUID_REPORT,
                read: true,
                notify: true,
                value: KeyboardReport::release().to_bytes().to_vec(),
                descriptors: vec![GattDescriptor {
                    uuid: UUID_CCCD,
                    readable: true,
                    writable: true,
                }],
            },
        ],
    }
}

/// Outcome of a connection callback after it was applied to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTransition {
    Connected(Device),
    Disconnected(Device),
    /// Duplicate connect or disconnect of an unknown device
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Closed,
    /// Server allocated, HID service not registered yet
    Open,
    Ready,
}

/// GATT server hosting the HID service
pub struct GattServiceHost {
    platform: Arc<dyn BlePlatform>,
    callbacks: GattServerCallbacks,
    state: ServerState,
    /// Live value of the Report characteristic
    report_value: [u8; KEYBOARD_REPORT_SIZE],
    /// CCCD value last written by each connected central
    subscriptions: HashMap<String, [u8; 2]>,
}

impl GattServiceHost {
    pub fn new(platform: Arc<dyn BlePlatform>, callbacks: GattServerCallbacks) -> Self {
        Self {
            platform,
            callbacks,
            state: ServerState::Closed,
            report_value: KeyboardReport::release().to_bytes(),
            subscriptions: HashMap::new(),
        }
    }

    /// Whether the server is open and the HID service is registered.
    pub fn is_ready(&self) -> bool {
        self.state == ServerState::Ready
    }

    /// Opens the GATT server and registers the HID service. The server stays
    /// open for the lifetime of the peripheral; a failed registration is
    /// retried on the next call without reopening it.
    pub async fn open(&mut self) -> Result<(), GattError> {
        if self.is_ready() {
            debug!("GATT server already open");
            return Ok(());
        }

        if self.state == ServerState::Closed {
            self.platform
                .open_gatt_server(self.callbacks.clone())
                .await
                .map_err(|e| {
                    error!("Failed to open GATT server: {}", e);
                    GattError::ServerOpenFailed(e)
                })?;
            info!("GATT server opened");
            self.state = ServerState::Open;
        }

        self.platform
            .add_service(&hid_service())
            .await
            .map_err(|e| {
                error!("Failed to add HID service: {}", e);
                GattError::ServerOpenFailed(e)
            })?;
        info!("HID service added");
        self.state = ServerState::Ready;
        Ok(())
    }

    /// Applies a link state change to the registry.
    pub fn on_connection_state_change(
        &mut self,
        registry: &mut ConnectionRegistry,
        device: Device,
        state: ConnectionState,
    ) -> ConnectionTransition {
        match state {
            ConnectionState::Connected => {
                info!("Device connected: {}", device.address);
                if registry.insert(device.clone()) {
                    ConnectionTransition::Connected(device)
                } else {
                    debug!("Device {} was already registered", device.address);
                    ConnectionTransition::Unchanged
                }
            }
            ConnectionState::Disconnected => {
                info!("Device disconnected: {}", device.address);
                self.subscriptions.remove(&device.address);
                match registry.remove(&device.address) {
                    // Prefer the name captured at connect time
                    Some(known) => ConnectionTransition::Disconnected(Device {
                        name: known.name.or(device.name),
                        address: known.address,
                    }),
                    None => {
                        warn!("Disconnect for unknown device {}", device.address);
                        ConnectionTransition::Unchanged
                    }
                }
            }
        }
    }

    /// Handles a descriptor write. Returns the new subscription state when a
    /// CCCD write was recognized.
    pub async fn on_descriptor_write(&mut self, request: DescriptorWriteRequest) -> Option<bool> {
        let mut subscribed = None;
        if request.descriptor == UUID_CCCD {
            let name = request.device.display_name();
            // The Report characteristic only supports notifications
            if request.value == ENABLE_NOTIFICATION_VALUE {
                info!("Device {} subscribed to notifications.", name);
                subscribed = Some(true);
            } else if request.value == DISABLE_NOTIFICATION_VALUE {
                info!("Device {} unsubscribed from notifications.", name);
                subscribed = Some(false);
            } else {
                warn!(
                    "Unrecognized CCCD value {:02X?} from {}",
                    request.value, name
                );
            }
            if subscribed.is_some() {
                let mut cccd = [0u8; 2];
                cccd.copy_from_slice(&request.value);
                self.subscriptions
                    .insert(request.device.address.clone(), cccd);
            }
        } else {
            debug!("Write to unhandled descriptor {}", request.descriptor);
        }

        if request.response_needed {
            if let Err(e) = self
                .platform
                .send_response(
                    &request.device.address,
                    request.request_id,
                    GattStatus::Success,
                    request.offset,
                    &request.value,
                )
                .await
            {
                error!(
                    "Failed to acknowledge descriptor write from {}: {}",
                    request.device.address, e
                );
            }
        }
        subscribed
    }

    /// Answers a descriptor read with the device's CCCD value.
    pub async fn on_descriptor_read(&self, request: DescriptorReadRequest) {
        let (status, value) = if request.descriptor == UUID_CCCD {
            let cccd = self
                .subscriptions
                .get(&request.device.address)
                .copied()
                .unwrap_or(DISABLE_NOTIFICATION_VALUE);
            slice_from(&cccd, request.offset)
        } else {
            (GattStatus::RequestNotSupported, Vec::new())
        };
        self.respond(&request.device.address, request.request_id, status, request.offset, &value)
            .await;
    }

    /// Answers a characteristic read for the Report Map or the Report value.
    pub async fn on_characteristic_read(&self, request: CharacteristicReadRequest) {
        let (status, value) = if request.characteristic == UUID_REPORT_MAP {
            slice_from(report_descriptor(), request.offset)
        } else if request.characteristic == UUID_REPORT {
            slice_from(&self.report_value, request.offset)
        } else {
            (GattStatus::RequestNotSupported, Vec::new())
        };
        self.respond(&request.device.address, request.request_id, status, request.offset, &value)
            .await;
    }

    /// Whether `address` has enabled notifications on the Report characteristic.
    pub fn is_subscribed(&self, address: &str) -> bool {
        self.subscriptions
            .get(address)
            .is_some_and(|v| *v != DISABLE_NOTIFICATION_VALUE)
    }

    pub fn report_value(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        self.report_value
    }

    /// Writes `report` into the Report characteristic and notifies `address`.
    pub async fn notify(
        &mut self,
        registry: &ConnectionRegistry,
        address: &str,
        report: KeyboardReport,
    ) -> Result<(), NotifyError> {
        if !registry.contains(address) {
            return Err(NotifyError::NotConnected(address.to_string()));
        }

        self.report_value = report.to_bytes();
        self.platform
            .notify_characteristic_changed(
                address,
                UUID_HID_SERVICE,
                UUID_REPORT,
                &self.report_value,
                false,
            )
            .await
            .map_err(|e| {
                warn!("Notification to {} failed: {}", address, e);
                NotifyError::NotifyFailed(e)
            })?;
        debug!("Notified {} with {:02X?}", address, self.report_value);
        Ok(())
    }

    async fn respond(
        &self,
        address: &str,
        request_id: u32,
        status: GattStatus,
        offset: u16,
        value: &[u8],
    ) {
        if let Err(e) = self
            .platform
            .send_response(address, request_id, status, offset, value)
            .await
        {
            error!("Failed to answer read request from {}: {}", address, e);
        }
    }
}

/// Returns the part of `value` starting at `offset`, or `InvalidOffset`.
fn slice_from(value: &[u8], offset: u16) -> (GattStatus, Vec<u8>) {
    let offset = offset as usize;
    if offset > value.len() {
        (GattStatus::InvalidOffset, Vec::new())
    } else {
        (GattStatus::Success, value[offset..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hid_service_topology() {
        let service = hid_service();
        assert_eq!(service.uuid.to_string(), "00001812-0000-1000-8000-00805f9b34fb");
        assert_eq!(service.characteristics.len(), 2);

        let report_map = service.characteristic(UUID_REPORT_MAP).unwrap();
        assert!(report_map.read && !report_map.notify);
        assert_eq!(report_map.value, report_descriptor());
        assert!(report_map.descriptors.is_empty());

        let report = service.characteristic(UUID_REPORT).unwrap();
        assert!(report.read && report.notify);
        assert_eq!(report.descriptors.len(), 1);
        assert_eq!(
            report.descriptors[0].uuid.to_string(),
            "00002902-0000-1000-8000-00805f9b34fb"
        );
        assert!(report.descriptors[0].readable && report.descriptors[0].writable);
    }

    #[test]
    fn slice_from_offsets() {
        assert_eq!(slice_from(&[1, 2, 3], 0), (GattStatus::Success, vec![1, 2, 3]));
        assert_eq!(slice_from(&[1, 2, 3], 2), (GattStatus::Success, vec![3]));
        assert_eq!(slice_from(&[1, 2, 3], 3), (GattStatus::Success, vec![]));
        assert_eq!(slice_from(&[1, 2, 3], 4), (GattStatus::InvalidOffset, vec![]));
    }
}
