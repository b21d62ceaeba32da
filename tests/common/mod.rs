//! Recording radio used by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use page_turner_peripheral::core::bluetooth::{
    AdvertiseCallbacks, AdvertiseData, AdvertiseSettings, BlePlatform, ConnectionState, Device,
    GattServerCallbacks, GattService, GattStatus, PlatformError,
};
use page_turner_peripheral::EventEmitter;
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Notification {
    pub address: String,
    pub service: Uuid,
    pub characteristic: Uuid,
    pub value: Vec<u8>,
    pub at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub address: String,
    pub request_id: u32,
    pub status: GattStatus,
    pub offset: u16,
    pub value: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    gatt_callbacks: Option<GattServerCallbacks>,
    advertise_callbacks: Option<AdvertiseCallbacks>,
    open_calls: usize,
    services: Vec<GattService>,
    advertise_requests: Vec<(AdvertiseSettings, AdvertiseData)>,
    stop_calls: usize,
    notifications: Vec<Notification>,
    responses: Vec<Response>,
    fail_open: bool,
    reject_services: Option<i32>,
    no_advertiser: bool,
    reject_advertise: Option<i32>,
    failing_notify: HashSet<String>,
}

#[derive(Default)]
pub struct RecordingPlatform {
    inner: Mutex<Inner>,
}

impl RecordingPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_open(&self) {
        self.inner.lock().unwrap().fail_open = true;
    }

    pub fn reject_services(&self, code: Option<i32>) {
        self.inner.lock().unwrap().reject_services = code;
    }

    pub fn remove_advertiser(&self) {
        self.inner.lock().unwrap().no_advertiser = true;
    }

    pub fn reject_advertising(&self, code: i32) {
        self.inner.lock().unwrap().reject_advertise = Some(code);
    }

    pub fn fail_notifications_to(&self, address: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_notify
            .insert(address.to_string());
    }

    pub fn gatt(&self) -> GattServerCallbacks {
        self.inner
            .lock()
            .unwrap()
            .gatt_callbacks
            .clone()
            .expect("GATT server not opened")
    }

    pub fn advertiser(&self) -> AdvertiseCallbacks {
        self.inner
            .lock()
            .unwrap()
            .advertise_callbacks
            .clone()
            .expect("advertising not started")
    }

    pub fn connect(&self, address: &str, name: Option<&str>) {
        self.gatt().on_connection_state_change(
            Device::new(address, name.map(str::to_string)),
            ConnectionState::Connected,
        );
    }

    pub fn disconnect(&self, address: &str) {
        self.gatt()
            .on_connection_state_change(Device::new(address, None), ConnectionState::Disconnected);
    }

    pub fn open_calls(&self) -> usize {
        self.inner.lock().unwrap().open_calls
    }

    pub fn services(&self) -> Vec<GattService> {
        self.inner.lock().unwrap().services.clone()
    }

    pub fn advertise_requests(&self) -> Vec<(AdvertiseSettings, AdvertiseData)> {
        self.inner.lock().unwrap().advertise_requests.clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.lock().unwrap().stop_calls
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().notifications.clone()
    }

    pub fn notifications_to(&self, address: &str) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.address == address)
            .collect()
    }

    pub fn responses(&self) -> Vec<Response> {
        self.inner.lock().unwrap().responses.clone()
    }
}

#[async_trait]
impl BlePlatform for RecordingPlatform {
    async fn open_gatt_server(&self, callbacks: GattServerCallbacks) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        inner.open_calls += 1;
        if inner.fail_open {
            return Err(PlatformError::Unavailable);
        }
        inner.gatt_callbacks = Some(callbacks);
        Ok(())
    }

    async fn add_service(&self, service: &GattService) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(code) = inner.reject_services {
            return Err(PlatformError::Rejected(code));
        }
        inner.services.push(service.clone());
        Ok(())
    }

    fn has_advertiser(&self) -> bool {
        !self.inner.lock().unwrap().no_advertiser
    }

    async fn start_advertising(
        &self,
        settings: &AdvertiseSettings,
        data: &AdvertiseData,
        callbacks: AdvertiseCallbacks,
    ) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(code) = inner.reject_advertise {
            return Err(PlatformError::Rejected(code));
        }
        inner
            .advertise_requests
            .push((settings.clone(), data.clone()));
        inner.advertise_callbacks = Some(callbacks);
        Ok(())
    }

    async fn stop_advertising(&self) {
        self.inner.lock().unwrap().stop_calls += 1;
    }

    async fn send_response(
        &self,
        address: &str,
        request_id: u32,
        status: GattStatus,
        offset: u16,
        value: &[u8],
    ) -> Result<(), PlatformError> {
        self.inner.lock().unwrap().responses.push(Response {
            address: address.to_string(),
            request_id,
            status,
            offset,
            value: value.to_vec(),
        });
        Ok(())
    }

    async fn notify_characteristic_changed(
        &self,
        address: &str,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
        _confirm: bool,
    ) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_notify.contains(address) {
            return Err(PlatformError::Rejected(0x8F));
        }
        inner.notifications.push(Notification {
            address: address.to_string(),
            service,
            characteristic,
            value: value.to_vec(),
            at: Instant::now(),
        });
        Ok(())
    }
}

/// Collects emitted UI events.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingEmitter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: &str, payload: Value) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
        Ok(())
    }
}
