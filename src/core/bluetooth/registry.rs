//! Connected central tracking
//! Holds every central with a live GATT link, keyed by address.

use std::collections::HashMap;

use crate::core::bluetooth::types::Device;

/// Set of centrals currently connected over GATT
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    devices: HashMap<String, Device>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connected device. Returns `true` if the address was not
    /// registered yet; otherwise the stored entry is refreshed.
    pub fn insert(&mut self, device: Device) -> bool {
        self.devices.insert(device.address.clone(), device).is_none()
    }

    /// Removes a device, returning it if it was registered.
    pub fn remove(&mut self, address: &str) -> Option<Device> {
        self.devices.remove(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.devices.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&Device> {
        self.devices.get(address)
    }

    /// Snapshot of the connected devices, ordered by address.
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.address.cmp(&b.address));
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn device(address: &str) -> Device {
        Device::new(address, None)
    }

    #[test]
    fn insert_reports_new_entries_only() {
        let mut registry = ConnectionRegistry::new();
        assert!(registry.insert(device("AA:BB")));
        assert!(!registry.insert(Device::new("AA:BB", Some("Kobo".into()))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("AA:BB").and_then(|d| d.name.as_deref()), Some("Kobo"));
    }

    #[test]
    fn remove_unknown_address_is_none() {
        let mut registry = ConnectionRegistry::new();
        assert!(registry.remove("AA:BB").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn devices_are_sorted_by_address() {
        let mut registry = ConnectionRegistry::new();
        registry.insert(device("CC"));
        registry.insert(device("AA"));
        registry.insert(device("BB"));
        let addresses: Vec<_> = registry.devices().into_iter().map(|d| d.address).collect();
        assert_eq!(addresses, vec!["AA", "BB", "CC"]);
    }

    proptest! {
        #[test]
        fn contents_track_unmatched_connects(events in prop::collection::vec((0u8..6, any::<bool>()), 0..64)) {
            let mut registry = ConnectionRegistry::new();
            let mut expected = BTreeSet::new();
            for (id, connected) in events {
                let address = format!("00:00:00:00:00:0{}", id);
                if connected {
                    registry.insert(device(&address));
                    expected.insert(address);
                } else {
                    registry.remove(&address);
                    expected.remove(&address);
                }
            }
            let actual: BTreeSet<_> = registry.devices().into_iter().map(|d| d.address).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
