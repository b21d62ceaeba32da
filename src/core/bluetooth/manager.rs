//! Peripheral manager for the page turner
//! This module owns the target selection and key dispatch. All state lives in
//! a single task; the clonable `Peripheral` handle posts commands to it and
//! the platform posts radio callbacks to it, so registry updates, target
//! changes and report notifications never interleave.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::peripheral_config::PeripheralConfig;
use crate::core::bluetooth::advertiser::AdvertisingController;
use crate::core::bluetooth::constants::KEY_RELEASE_DELAY_MS;
use crate::core::bluetooth::error::{InitError, PeripheralError, SendError, TargetError};
use crate::core::bluetooth::gatt::{ConnectionTransition, GattServiceHost};
use crate::core::bluetooth::platform::{
    AdvertiseCallbacks, BlePlatform, GattServerCallbacks, RadioEvent,
};
use crate::core::bluetooth::registry::ConnectionRegistry;
use crate::core::bluetooth::types::{AdvertisingState, Device, PeripheralEvent};
use crate::core::hid::KeyboardReport;

enum Command {
    Initialize {
        reply: oneshot::Sender<Result<(), InitError>>,
    },
    StopAdvertising {
        reply: oneshot::Sender<()>,
    },
    SetTarget {
        address: String,
        reply: oneshot::Sender<Result<(), TargetError>>,
    },
    SendKey {
        key_code: u8,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    ConnectedDevices {
        reply: oneshot::Sender<Vec<Device>>,
    },
    Target {
        reply: oneshot::Sender<Option<Device>>,
    },
    AdvertisingState {
        reply: oneshot::Sender<AdvertisingState>,
    },
    IsSubscribed {
        address: String,
        reply: oneshot::Sender<bool>,
    },
}

/// A release that fell due for the target selected under `generation`
#[derive(Debug)]
struct ScheduledRelease {
    address: String,
    generation: u64,
}

/// The selected target. Every selection gets a fresh generation and token;
/// cancelling the token aborts the releases still pending for it.
struct Target {
    address: String,
    generation: u64,
    cancel: CancellationToken,
}

/// A clonable handle that sends commands to the peripheral task.
///
/// The task stops once every handle has been dropped.
#[derive(Clone)]
pub struct Peripheral {
    tx: mpsc::Sender<Command>,
}

impl Peripheral {
    /// Spawns the peripheral task on the current Tokio runtime.
    ///
    /// Returns the handle and the stream of lifecycle events.
    pub fn new(
        platform: Arc<dyn BlePlatform>,
        config: PeripheralConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PeripheralEvent>) {
        let (tx, rx) = mpsc::channel(config.command_queue_capacity.max(1));
        let (radio_tx, radio_rx) = mpsc::unbounded_channel();
        let (release_tx, release_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let gatt = GattServiceHost::new(platform.clone(), GattServerCallbacks::new(radio_tx.clone()));
        let advertiser =
            AdvertisingController::new(platform, AdvertiseCallbacks::new(radio_tx), &config);

        let task = PeripheralTask {
            gatt,
            advertiser,
            registry: ConnectionRegistry::new(),
            target: None,
            next_generation: 0,
            release_tx,
            events: event_tx,
        };
        tokio::spawn(task.run(rx, radio_rx, release_rx));
        info!("Peripheral task started.");

        (Self { tx }, event_rx)
    }

    /// Opens the GATT server, then starts advertising.
    pub async fn initialize(&self) -> Result<(), PeripheralError> {
        Ok(self.request(|reply| Command::Initialize { reply }).await??)
    }

    /// Stops advertising; the GATT server and existing links stay up.
    pub async fn stop_advertising(&self) {
        if self
            .request(|reply| Command::StopAdvertising { reply })
            .await
            .is_err()
        {
            debug!("Peripheral task gone, nothing to stop");
        }
    }

    /// Selects the connected device that receives key reports.
    pub async fn set_target(&self, address: &str) -> Result<(), PeripheralError> {
        let address = address.to_string();
        Ok(self
            .request(|reply| Command::SetTarget { address, reply })
            .await??)
    }

    /// Sends a press of `key_code` to the target and schedules its release.
    pub async fn send_key(&self, key_code: u8) -> Result<(), PeripheralError> {
        Ok(self
            .request(|reply| Command::SendKey { key_code, reply })
            .await??)
    }

    pub async fn connected_devices(&self) -> Result<Vec<Device>, PeripheralError> {
        self.request(|reply| Command::ConnectedDevices { reply }).await
    }

    /// The current target, if any.
    pub async fn target(&self) -> Result<Option<Device>, PeripheralError> {
        self.request(|reply| Command::Target { reply }).await
    }

    pub async fn advertising_state(&self) -> Result<AdvertisingState, PeripheralError> {
        self.request(|reply| Command::AdvertisingState { reply })
            .await
    }

    /// Whether `address` has enabled report notifications.
    pub async fn is_subscribed(&self, address: &str) -> Result<bool, PeripheralError> {
        let address = address.to_string();
        self.request(|reply| Command::IsSubscribed { address, reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PeripheralError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| PeripheralError::Closed)?;
        rx.await.map_err(|_| PeripheralError::Closed)
    }
}

struct PeripheralTask {
    gatt: GattServiceHost,
    advertiser: AdvertisingController,
    registry: ConnectionRegistry,
    target: Option<Target>,
    next_generation: u64,
    release_tx: mpsc::UnboundedSender<ScheduledRelease>,
    events: mpsc::UnboundedSender<PeripheralEvent>,
}

impl PeripheralTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut radio: mpsc::UnboundedReceiver<RadioEvent>,
        mut releases: mpsc::UnboundedReceiver<ScheduledRelease>,
    ) {
        loop {
            // Radio callbacks first so commands always see the latest links.
            // A radio that never goes quiet would starve commands and releases.
            tokio::select! {
                biased;
                Some(event) = radio.recv() => self.handle_radio_event(event).await,
                Some(release) = releases.recv() => self.handle_release(release).await,
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }

        self.clear_target();
        info!("Peripheral task stopped.");
    }

    async fn handle_command(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            Command::Initialize { reply } => {
                let _ = reply.send(self.initialize().await);
            }
            Command::StopAdvertising { reply } => {
                self.advertiser.stop().await;
                let _ = reply.send(());
            }
            Command::SetTarget { address, reply } => {
                let _ = reply.send(self.set_target(address));
            }
            Command::SendKey { key_code, reply } => {
                let _ = reply.send(self.send_key(key_code).await);
            }
            Command::ConnectedDevices { reply } => {
                let _ = reply.send(self.registry.devices());
            }
            Command::Target { reply } => {
                let target = self
                    .target
                    .as_ref()
                    .and_then(|t| self.registry.get(&t.address))
                    .cloned();
                let _ = reply.send(target);
            }
            Command::AdvertisingState { reply } => {
                let _ = reply.send(self.advertiser.state());
            }
            Command::IsSubscribed { address, reply } => {
                let _ = reply.send(self.gatt.is_subscribed(&address));
            }
        }
    }

    async fn initialize(&mut self) -> Result<(), InitError> {
        info!("Starting peripheral mode...");
        // No rollback: an open server stays open if advertising fails.
        self.gatt.open().await?;
        self.advertiser.start().await?;
        info!("Peripheral online, advertising HID service.");
        Ok(())
    }

    fn set_target(&mut self, address: String) -> Result<(), TargetError> {
        let Some(device) = self.registry.get(&address) else {
            error!("Could not find device with address: {}", address);
            return Err(TargetError::DeviceNotConnected(address));
        };
        info!("Target device set to: {}", device.display_name());

        if self
            .target
            .as_ref()
            .is_some_and(|t| t.address == address)
        {
            return Ok(());
        }

        self.clear_target();
        self.next_generation += 1;
        self.target = Some(Target {
            address,
            generation: self.next_generation,
            cancel: CancellationToken::new(),
        });
        Ok(())
    }

    async fn send_key(&mut self, key_code: u8) -> Result<(), SendError> {
        let Some(target) = self.target.as_ref() else {
            warn!("No target device selected, dropping key 0x{:02X}", key_code);
            return Err(SendError::NoTargetSelected);
        };
        let address = target.address.clone();
        let generation = target.generation;
        let cancel = target.cancel.clone();

        self.gatt
            .notify(&self.registry, &address, KeyboardReport::press(key_code))
            .await?;
        debug!("Key 0x{:02X} pressed on {}", key_code, address);

        self.schedule_release(address, generation, cancel);
        Ok(())
    }

    /// Fires the release `KEY_RELEASE_DELAY_MS` after the press notification
    /// returned, unless the target changes first.
    fn schedule_release(&self, address: String, generation: u64, cancel: CancellationToken) {
        let release_tx = self.release_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Release for {} cancelled, target changed", address);
                }
                _ = sleep(Duration::from_millis(KEY_RELEASE_DELAY_MS)) => {
                    let _ = release_tx.send(ScheduledRelease { address, generation });
                }
            }
        });
    }

    async fn handle_release(&mut self, release: ScheduledRelease) {
        let current = self
            .target
            .as_ref()
            .is_some_and(|t| t.address == release.address && t.generation == release.generation);
        if !current {
            debug!("Dropping stale release for {}", release.address);
            return;
        }

        if let Err(e) = self
            .gatt
            .notify(&self.registry, &release.address, KeyboardReport::release())
            .await
        {
            warn!("Key release to {} failed: {}", release.address, e);
            self.emit(PeripheralEvent::NotifyFailed {
                address: release.address,
                reason: e.to_string(),
            });
        }
    }

    async fn handle_radio_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::ConnectionStateChanged { device, state } => {
                match self
                    .gatt
                    .on_connection_state_change(&mut self.registry, device, state)
                {
                    ConnectionTransition::Connected(device) => {
                        self.emit(PeripheralEvent::Connected {
                            name: device.display_name().to_string(),
                            address: device.address,
                        });
                    }
                    ConnectionTransition::Disconnected(device) => {
                        let lost = self
                            .target
                            .as_ref()
                            .is_some_and(|t| t.address == device.address);
                        if lost {
                            self.clear_target();
                            info!("Target device {} lost", device.address);
                        }
                        self.emit(PeripheralEvent::Disconnected {
                            name: device.display_name().to_string(),
                            address: device.address.clone(),
                        });
                        if lost {
                            self.emit(PeripheralEvent::TargetLost {
                                address: device.address,
                            });
                        }
                    }
                    ConnectionTransition::Unchanged => {}
                }
            }
            RadioEvent::DescriptorWrite(request) => {
                let address = request.device.address.clone();
                if let Some(subscribed) = self.gatt.on_descriptor_write(request).await {
                    self.emit(PeripheralEvent::SubscriptionChanged {
                        address,
                        subscribed,
                    });
                }
            }
            RadioEvent::DescriptorRead(request) => self.gatt.on_descriptor_read(request).await,
            RadioEvent::CharacteristicRead(request) => {
                self.gatt.on_characteristic_read(request).await
            }
            RadioEvent::AdvertiseStartSucceeded => {
                if self.advertiser.on_start_success() {
                    self.emit(PeripheralEvent::AdvertisingStarted);
                }
            }
            RadioEvent::AdvertiseStartFailed { code } => {
                if self.advertiser.on_start_failure(code) {
                    self.emit(PeripheralEvent::AdvertisingFailed { code });
                }
            }
        }
    }

    fn clear_target(&mut self) {
        if let Some(target) = self.target.take() {
            target.cancel.cancel();
        }
    }

    fn emit(&self, event: PeripheralEvent) {
        if self.events.send(event).is_err() {
            debug!("No listener for peripheral events");
        }
    }
}
