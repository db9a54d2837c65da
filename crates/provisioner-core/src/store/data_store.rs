// ── Central reactive data store ──
//
// Holds everything the controller exposes: the device collection, the
// alert log and poll bookkeeping. Mutations are broadcast to subscribers
// via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::alert_log::AlertLog;
use super::device_collection::{DeviceCollection, DeviceMap};
use crate::model::{Alert, Device};
use crate::stream::StateStream;

/// Reactive store behind a [`Provisioner`](crate::Provisioner).
///
/// Only the controller writes; everything public here is read-only.
pub struct DataStore {
    pub(crate) devices: DeviceCollection,
    pub(crate) alerts: AlertLog,
    pub(crate) last_poll: watch::Sender<Option<DateTime<Utc>>>,
    /// Number of completed polls, successful or not.
    pub(crate) poll_generation: watch::Sender<u64>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_poll, _) = watch::channel(None);
        let (poll_generation, _) = watch::channel(0);

        Self {
            devices: DeviceCollection::new(),
            alerts: AlertLog::new(),
            last_poll,
            poll_generation,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<DeviceMap> {
        self.devices.snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Alert>> {
        self.alerts.snapshot()
    }

    pub fn device_by_mac(&self, mac: &str) -> Option<Arc<Device>> {
        self.devices.get(mac)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> StateStream<Arc<DeviceMap>> {
        StateStream::new(self.devices.subscribe())
    }

    pub fn subscribe_alerts(&self) -> StateStream<Arc<Vec<Alert>>> {
        StateStream::new(self.alerts.subscribe())
    }

    pub fn subscribe_polls(&self) -> StateStream<u64> {
        StateStream::new(self.poll_generation.subscribe())
    }

    // ── Poll bookkeeping ─────────────────────────────────────────────

    /// Time of the last successful poll.
    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_poll.borrow()
    }

    /// How long ago the last successful poll landed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_poll().map(|t| Utc::now() - t)
    }

    pub fn poll_generation(&self) -> u64 {
        *self.poll_generation.borrow()
    }

    pub(crate) fn apply_poll(&self, devices: Vec<Device>) -> usize {
        let count = self.devices.replace_all(devices);
        self.last_poll.send_replace(Some(Utc::now()));
        count
    }

    pub(crate) fn finish_poll(&self) {
        self.poll_generation.send_modify(|g| *g += 1);
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    #[test]
    fn apply_poll_records_time_and_count() {
        let store = DataStore::new();
        assert!(store.last_poll().is_none());
        assert_eq!(store.apply_poll(vec![Device::new("b"), Device::new("a")]), 2);
        assert_eq!(store.device_count(), 2);
        assert!(store.data_age().is_some());
        assert_eq!(store.poll_generation(), 0);
        store.finish_poll();
        assert_eq!(store.poll_generation(), 1);
    }

    #[test]
    fn alert_subscription_sees_pushes() {
        let store = DataStore::new();
        let stream = store.subscribe_alerts();
        store.alerts.push(Alert::new(Severity::Success, "ok"));
        assert_eq!(stream.latest().len(), 1);
        assert!(stream.current().is_empty());
    }
}
