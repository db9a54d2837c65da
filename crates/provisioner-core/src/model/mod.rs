// ── Domain model ──

mod alert;
mod device;

pub use alert::{Alert, Severity};
pub use device::{Device, DeviceStatus, MacAddress};
