//! Controller layer between `provisioner-api` and front ends.
//!
//! This crate owns the business logic, domain model, and reactive state of
//! the device provisioner:
//!
//! - **[`Provisioner`]**: Central facade. [`bootstrap()`](Provisioner::bootstrap)
//!   fetches the server's URL directory and builds the controller, which polls
//!   the device list immediately and then on a cancellable timer driven by
//!   [`set_refresh_rate()`](Provisioner::set_refresh_rate). Device actions go
//!   through [`perform_action()`](Provisioner::perform_action), which validates
//!   locally before calling the server.
//!
//! - **[`UrlDirectory`]**: Named URL templates with `{param}` placeholders,
//!   filled in textually (no percent-encoding).
//!
//! - **[`DataStore`]**: `tokio::sync::watch`-backed snapshots of the device
//!   collection and the five-entry alert log.
//!
//! - **[`StateStream<T>`]**: Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` and converts into a
//!   `Stream`.
//!
//! Runtime failures (unreachable server, bad responses, failed validation)
//! never surface as `Err`: they are recorded as `danger` alerts. Only API
//! misuse ([`CoreError::is_contract_violation`]) is returned to the caller.

pub mod action;
pub mod config;
pub mod controller;
pub mod convert;
pub mod directory;
pub mod error;
pub mod model;
pub mod refresh;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{DeviceAction, Precondition};
pub use config::{DEFAULT_DIRECTORY_PATH, ProvisionerConfig, TlsVerification};
pub use controller::Provisioner;
pub use directory::{UrlDirectory, UrlParams};
pub use error::CoreError;
pub use model::{Alert, Device, DeviceStatus, MacAddress, Severity};
pub use refresh::{MIN_REFRESH_INTERVAL, RefreshRate};
pub use store::{DataStore, DeviceMap, MAX_ALERTS};
pub use stream::{StateStream, StateWatchStream};
