// ── Device collection ──
//
// MAC-keyed device map, replaced wholesale on every successful poll and
// broadcast to subscribers through a `watch` channel.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::{Device, MacAddress};

/// Ordered snapshot of the device collection, MAC ascending.
pub type DeviceMap = IndexMap<MacAddress, Arc<Device>>;

pub(crate) struct DeviceCollection {
    snapshot: watch::Sender<Arc<DeviceMap>>,
}

impl DeviceCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(DeviceMap::new()));
        Self { snapshot }
    }

    /// Replace the whole collection. Entries are ordered by MAC; when the
    /// same MAC appears more than once the last entry wins.
    pub(crate) fn replace_all(&self, devices: Vec<Device>) -> usize {
        let mut map: DeviceMap = devices
            .into_iter()
            .map(|d| (d.mac.clone(), Arc::new(d)))
            .collect();
        map.sort_unstable_keys();
        let len = map.len();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(map));
        len
    }

    pub(crate) fn get(&self, mac: &str) -> Option<Arc<Device>> {
        self.snapshot.borrow().get(mac).cloned()
    }

    pub(crate) fn snapshot(&self) -> Arc<DeviceMap> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<DeviceMap>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }
}
