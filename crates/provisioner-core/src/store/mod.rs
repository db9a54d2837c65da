// ── Reactive data store ──
//
// Snapshot storage with push-based change notification.

mod alert_log;
mod data_store;
mod device_collection;

pub use alert_log::MAX_ALERTS;
pub use data_store::DataStore;
pub use device_collection::DeviceMap;
