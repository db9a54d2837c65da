// provisioner-api: Async Rust client for the device provisioner HTTP API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ProvisionerClient;
pub use error::Error;
pub use models::{ActionResponse, DeviceRecord};
pub use transport::{TlsMode, TransportConfig};
