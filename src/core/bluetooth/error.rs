//! Error types for the peripheral
//! Each component reports its own failures; `PeripheralError` is what the
//! public handle returns.

use thiserror::Error;

/// Failures reported by the platform radio stack
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Bluetooth is off or the capability is absent
    #[error("bluetooth radio unavailable")]
    Unavailable,
    #[error("request rejected by the bluetooth stack (code {0})")]
    Rejected(i32),
    #[error("device {0} is not connected")]
    NotConnected(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvertisingError {
    #[error("failed to create advertiser")]
    AdvertiserUnavailable,
    #[error("advertising failed to start (code {0})")]
    AdvertiseStartFailed(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GattError {
    #[error("failed to open GATT server: {0}")]
    ServerOpenFailed(PlatformError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("device {0} is not connected")]
    NotConnected(String),
    #[error("notification rejected: {0}")]
    NotifyFailed(PlatformError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error(transparent)]
    Gatt(#[from] GattError),
    #[error(transparent)]
    Advertising(#[from] AdvertisingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("device {0} not found or not connected")]
    DeviceNotConnected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("no target device selected")]
    NoTargetSelected,
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Errors returned by the `Peripheral` handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeripheralError {
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Send(#[from] SendError),
    /// The peripheral task has exited
    #[error("peripheral task is not running")]
    Closed,
}
