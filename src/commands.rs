//! Application commands
//! This module defines the commands the control UI invokes and the events it
//! receives. Errors carry stable codes the UI can branch on.

use std::sync::Arc;

use log::{debug, error, info};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::bluetooth::{
    AdvertisingError, Device, GattError, InitError, NotifyError, PeripheralError,
    PeripheralEvent, SendError, TargetError,
};
use crate::core::hid::PageTurn;
use crate::emitter::EventEmitter;
use crate::state::AppState;

pub const EVENT_CONNECTION_STATE_CHANGED: &str = "onHidConnectionStateChanged";
pub const EVENT_TARGET_LOST: &str = "onHidTargetLost";
pub const EVENT_ADVERTISE_FAILED: &str = "onHidAdvertiseFailed";

/// Error returned to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct CommandError {
    pub code: &'static str,
    pub message: String,
}

impl CommandError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<PeripheralError> for CommandError {
    fn from(e: PeripheralError) -> Self {
        let message = e.to_string();
        let code = match e {
            PeripheralError::Init(InitError::Gatt(GattError::ServerOpenFailed(_))) => {
                "GATT_SERVER_ERROR"
            }
            PeripheralError::Init(InitError::Advertising(
                AdvertisingError::AdvertiserUnavailable,
            )) => "ADVERTISER_ERROR",
            PeripheralError::Init(InitError::Advertising(
                AdvertisingError::AdvertiseStartFailed(_),
            )) => "ADVERTISE_FAILED",
            PeripheralError::Target(TargetError::DeviceNotConnected(_)) => "NOT_FOUND",
            PeripheralError::Send(SendError::NoTargetSelected) => "NO_TARGET",
            PeripheralError::Send(SendError::Notify(NotifyError::NotConnected(_))) => "NOT_FOUND",
            PeripheralError::Send(SendError::Notify(NotifyError::NotifyFailed(_))) => {
                "NOTIFY_FAILED"
            }
            PeripheralError::Closed => "PERIPHERAL_CLOSED",
        };
        Self::new(code, message)
    }
}

/// Brings the peripheral online: GATT service plus advertising.
pub async fn start(app_state: &AppState) -> Result<(), CommandError> {
    app_state.peripheral.initialize().await?;
    info!("Started advertising as a HID device.");
    Ok(())
}

/// Stops advertising. The GATT server and current links stay up.
pub async fn stop(app_state: &AppState) {
    app_state.peripheral.stop_advertising().await;
}

pub async fn set_target_device(address: String, app_state: &AppState) -> Result<bool, CommandError> {
    app_state.peripheral.set_target(&address).await?;
    Ok(true)
}

/// Sends a single key press (USB HID usage ID) to the target device.
pub async fn send_key_press(key_code: i64, app_state: &AppState) -> Result<(), CommandError> {
    let key_code = u8::try_from(key_code).map_err(|_| {
        CommandError::new(
            "INVALID_KEY_CODE",
            format!("Key code {} is outside 0-255", key_code),
        )
    })?;
    app_state.peripheral.send_key(key_code).await?;
    Ok(())
}

/// Turns the page in `direction` ("left" / "right").
pub async fn send_page_turn(direction: String, app_state: &AppState) -> Result<(), CommandError> {
    let page_turn = PageTurn::from_direction(&direction).ok_or_else(|| {
        CommandError::new(
            "INVALID_DIRECTION",
            format!("Unknown page direction: {}", direction),
        )
    })?;
    app_state.peripheral.send_key(page_turn.key_code()).await?;
    Ok(())
}

/// Lists the connected centrals for the device picker.
pub async fn connected_devices(app_state: &AppState) -> Result<Vec<Device>, CommandError> {
    Ok(app_state.peripheral.connected_devices().await?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Payload of `onHidConnectionStateChanged`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStateChanged {
    pub status: ConnectionStatus,
    pub address: String,
    pub name: String,
}

/// Maps a peripheral event to the named UI event it produces, if any.
pub fn app_event(event: &PeripheralEvent) -> Option<(&'static str, serde_json::Value)> {
    match event {
        PeripheralEvent::Connected { address, name } => Some((
            EVENT_CONNECTION_STATE_CHANGED,
            serde_json::json!(ConnectionStateChanged {
                status: ConnectionStatus::Connected,
                address: address.clone(),
                name: name.clone(),
            }),
        )),
        PeripheralEvent::Disconnected { address, name } => Some((
            EVENT_CONNECTION_STATE_CHANGED,
            serde_json::json!(ConnectionStateChanged {
                status: ConnectionStatus::Disconnected,
                address: address.clone(),
                name: name.clone(),
            }),
        )),
        PeripheralEvent::TargetLost { address } => Some((
            EVENT_TARGET_LOST,
            serde_json::json!({ "address": address }),
        )),
        PeripheralEvent::AdvertisingFailed { code } => Some((
            EVENT_ADVERTISE_FAILED,
            serde_json::json!({ "code": code }),
        )),
        _ => None,
    }
}

/// Forwards peripheral events to the UI until the peripheral shuts down.
pub async fn forward_events(
    mut events: mpsc::UnboundedReceiver<PeripheralEvent>,
    emitter: Arc<dyn EventEmitter>,
) {
    while let Some(event) = events.recv().await {
        match app_event(&event) {
            Some((name, payload)) => {
                if let Err(e) = emitter.emit(name, payload) {
                    error!("Failed to emit {} event: {}", name, e);
                }
            }
            None => debug!("Peripheral event not forwarded: {:?}", event),
        }
    }
    info!("Peripheral event stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::PlatformError;

    #[test]
    fn error_codes() {
        let code = |e: PeripheralError| CommandError::from(e).code;
        assert_eq!(
            code(TargetError::DeviceNotConnected("AA".into()).into()),
            "NOT_FOUND"
        );
        assert_eq!(code(SendError::NoTargetSelected.into()), "NO_TARGET");
        assert_eq!(
            code(InitError::Gatt(GattError::ServerOpenFailed(PlatformError::Unavailable)).into()),
            "GATT_SERVER_ERROR"
        );
        assert_eq!(
            code(InitError::Advertising(AdvertisingError::AdvertiserUnavailable).into()),
            "ADVERTISER_ERROR"
        );
        assert_eq!(
            code(InitError::Advertising(AdvertisingError::AdvertiseStartFailed(1)).into()),
            "ADVERTISE_FAILED"
        );
        assert_eq!(code(PeripheralError::Closed), "PERIPHERAL_CLOSED");
    }

    #[test]
    fn connection_event_payload() {
        let (name, payload) = app_event(&PeripheralEvent::Disconnected {
            address: "AA:BB".into(),
            name: "Kindle".into(),
        })
        .unwrap();
        assert_eq!(name, EVENT_CONNECTION_STATE_CHANGED);
        assert_eq!(
            payload,
            serde_json::json!({ "status": "disconnected", "address": "AA:BB", "name": "Kindle" })
        );
        assert!(app_event(&PeripheralEvent::AdvertisingStarted).is_none());
    }
}
