// ── Provisioner controller ──
//
// Owns the polling lifecycle, the device cache, URL resolution, action
// dispatch and the alert log. Runtime failures never escape: they are
// turned into `danger` alerts and the controller stays usable.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use provisioner_api::{ActionResponse, ProvisionerClient};

use crate::action::DeviceAction;
use crate::config::ProvisionerConfig;
use crate::directory::{UrlDirectory, UrlParams};
use crate::error::CoreError;
use crate::model::{Alert, Device, Severity};
use crate::refresh::{RefreshRate, RefreshTimer};
use crate::store::{DataStore, DeviceMap};
use crate::stream::StateStream;

/// Directory entry polled for the device list.
const DEVICES_ENDPOINT: &str = "devices";
/// Directory entry for a single device.
const DEVICE_ENDPOINT: &str = "device";

// ── Provisioner ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ProvisionerInner>`. All methods that start
/// background work must be called from within a Tokio runtime. Dropping
/// the last handle stops the refresh timer.
#[derive(Clone)]
pub struct Provisioner {
    inner: Arc<ProvisionerInner>,
}

struct ProvisionerInner {
    directory: UrlDirectory,
    client: ProvisionerClient,
    devices_url: Url,
    store: Arc<DataStore>,
    refresh_rate: watch::Sender<RefreshRate>,
    timer: Mutex<Option<RefreshTimer>>,
    cancel: CancellationToken,
}

impl Provisioner {
    /// Create a controller over an already-fetched URL directory.
    ///
    /// Fires one device poll immediately and applies `refresh`. Fails if
    /// the directory has no usable `devices` entry or `refresh` is invalid.
    pub fn new(
        directory: UrlDirectory,
        client: ProvisionerClient,
        refresh: RefreshRate,
    ) -> Result<Self, CoreError> {
        let raw = directory.resolve(DEVICES_ENDPOINT, &UrlParams::new())?;
        let devices_url = client.endpoint(&raw).map_err(|e| CoreError::Config {
            message: format!("invalid devices URL {raw:?}: {e}"),
        })?;
        let refresh = refresh.validate()?;
        let (refresh_rate, _) = watch::channel(RefreshRate::Disabled);

        let provisioner = Self {
            inner: Arc::new(ProvisionerInner {
                directory,
                client,
                devices_url,
                store: Arc::new(DataStore::new()),
                refresh_rate,
                timer: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        };

        debug!(url = %provisioner.inner.devices_url, "provisioner created");
        provisioner.refresh();
        provisioner.set_refresh_rate(refresh)?;
        Ok(provisioner)
    }

    /// Fetch the URL directory from the server, then construct the controller.
    pub async fn bootstrap(config: &ProvisionerConfig) -> Result<Self, CoreError> {
        let client = ProvisionerClient::new(config.url.clone(), &config.transport())
            .map_err(|source| CoreError::Bootstrap { source })?;

        let templates = client
            .fetch_directory(&config.directory_path)
            .await
            .map_err(|source| {
                warn!(error = %source, url = %config.url, "URL directory fetch failed");
                CoreError::Bootstrap { source }
            })?;

        info!(
            url = %config.url,
            endpoints = templates.len(),
            "URL directory loaded"
        );
        Self::new(UrlDirectory::from(templates), client, config.refresh)
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn directory(&self) -> &UrlDirectory {
        &self.inner.directory
    }

    /// Resolve a named URL template. See [`UrlDirectory::resolve`].
    pub fn resolve(&self, name: &str, params: &UrlParams) -> Result<String, CoreError> {
        self.inner.directory.resolve(name, params)
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Fetch the device list and replace the collection with it.
    ///
    /// Failures become a `danger` alert. Overlapping polls are allowed;
    /// whichever response lands last wins.
    pub async fn poll_devices(&self) {
        let url = self.inner.devices_url.clone();
        match self.inner.client.list_devices(url).await {
            Ok(records) => {
                let devices: Vec<Device> = records.into_iter().map(Device::from).collect();
                let count = self.inner.store.apply_poll(devices);
                debug!(count, "device poll complete");
            }
            Err(e) => {
                warn!(error = %e, "device poll failed");
                let err = CoreError::from_request_failure(&e);
                self.log_alert(Severity::Danger, err.to_string());
            }
        }
        self.inner.store.finish_poll();
    }

    /// Spawn [`poll_devices`](Self::poll_devices) without waiting for it.
    pub fn refresh(&self) -> JoinHandle<()> {
        let provisioner = self.clone();
        tokio::spawn(async move { provisioner.poll_devices().await })
    }

    /// Wait until at least one poll has completed since construction.
    pub async fn wait_for_first_poll(&self) {
        let _ = self
            .inner
            .store
            .subscribe_polls()
            .wait_for(|generation| *generation >= 1)
            .await;
    }

    /// Fetch one device from the `device` endpoint. The cache is untouched.
    pub async fn fetch_device(&self, mac: &str) -> Result<Device, CoreError> {
        let raw = self.resolve(DEVICE_ENDPOINT, &UrlParams::new().with("mac", mac))?;
        let url = self
            .inner
            .client
            .endpoint(&raw)
            .map_err(|e| CoreError::Config {
                message: format!("invalid device URL {raw:?}: {e}"),
            })?;

        self.inner
            .client
            .get_device(url)
            .await
            .map(Device::from)
            .map_err(|e| CoreError::from_request_failure(&e))
    }

    // ── Refresh rate ─────────────────────────────────────────────

    /// Change the polling rate.
    ///
    /// Any running timer is cancelled first. An invalid rate is rejected
    /// before anything changes.
    pub fn set_refresh_rate(&self, rate: RefreshRate) -> Result<(), CoreError> {
        let rate = rate.validate()?;
        let mut timer = self.lock_timer();
        if let Some(previous) = timer.take() {
            previous.cancel();
        }

        if let Some(period) = rate.interval() {
            let weak = Arc::downgrade(&self.inner);
            *timer = Some(RefreshTimer::start(period, &self.inner.cancel, move || {
                let Some(inner) = weak.upgrade() else {
                    return false;
                };
                Provisioner { inner }.refresh();
                true
            }));
        }
        drop(timer);

        self.inner.refresh_rate.send_replace(rate);
        info!(rate = %rate.human(), "refresh rate set");
        Ok(())
    }

    pub fn refresh_rate(&self) -> RefreshRate {
        *self.inner.refresh_rate.borrow()
    }

    pub fn refresh_rate_human(&self) -> String {
        self.refresh_rate().human()
    }

    /// Whether a refresh timer is currently scheduled.
    pub fn has_pending_refresh(&self) -> bool {
        self.lock_timer().as_ref().is_some_and(RefreshTimer::is_active)
    }

    /// Stop periodic polling for good. Later rate changes schedule nothing.
    pub fn shutdown(&self) {
        if let Some(timer) = self.lock_timer().take() {
            timer.cancel();
        }
        self.inner.cancel.cancel();
        self.inner.refresh_rate.send_replace(RefreshRate::Disabled);
        debug!("provisioner shut down");
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<RefreshTimer>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Validate and dispatch `action` for the device `mac`.
    ///
    /// Exactly one alert is logged per call and returned.
    pub async fn perform_action(&self, action: &str, mac: &str) -> Alert {
        match self.dispatch_action(action, mac).await {
            Ok(response) => self.log_alert(response.kind, response.message),
            Err(e) => self.log_alert(Severity::Danger, e.to_string()),
        }
    }

    /// Spawn [`perform_action`](Self::perform_action) without waiting for it.
    pub fn trigger_action(
        &self,
        action: impl Into<String>,
        mac: impl Into<String>,
    ) -> JoinHandle<Alert> {
        let provisioner = self.clone();
        let (action, mac) = (action.into(), mac.into());
        tokio::spawn(async move { provisioner.perform_action(&action, &mac).await })
    }

    async fn dispatch_action(&self, action: &str, mac: &str) -> Result<ActionResponse, CoreError> {
        let device = self
            .device(mac)
            .ok_or_else(|| CoreError::DeviceNotFound { mac: mac.into() })?;

        let action: DeviceAction = action.parse().map_err(|_| CoreError::UnknownAction {
            action: action.into(),
        })?;

        let url = self.action_url(action, mac)?;

        if let Some(precondition) = action.precondition() {
            if !precondition.is_met(&device) {
                return Err(CoreError::PreconditionFailed {
                    precondition,
                    mac: mac.into(),
                });
            }
        }

        info!(%action, mac, "dispatching device action");
        match self.inner.client.post_action(url).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(%action, mac, error = %e, "device action failed");
                e.response_body().cloned().ok_or_else(|| CoreError::ActionFailed {
                    action,
                    mac: mac.into(),
                    detail: e.status_or_error(),
                })
            }
        }
    }

    fn action_url(&self, action: DeviceAction, mac: &str) -> Result<Url, CoreError> {
        let raw = self
            .resolve(action.endpoint_name(), &UrlParams::new().with("mac", mac))
            .map_err(|_| CoreError::MissingRoute { action })?;
        self.inner
            .client
            .endpoint(&raw)
            .map_err(|_| CoreError::MissingRoute { action })
    }

    // ── Alerts ───────────────────────────────────────────────────

    /// Prepend an alert to the log, keeping the newest five.
    pub fn log_alert(&self, severity: impl Into<Severity>, message: impl Into<String>) -> Alert {
        let alert = Alert::new(severity.into(), message);
        debug!(severity = %alert.severity, message = %alert.message, "alert");
        self.inner.store.alerts.push(alert.clone());
        alert
    }

    // ── Snapshots ────────────────────────────────────────────────

    /// All cached devices, ordered by MAC.
    pub fn devices(&self) -> Arc<DeviceMap> {
        self.inner.store.devices_snapshot()
    }

    pub fn device(&self, mac: &str) -> Option<Arc<Device>> {
        self.inner.store.device_by_mac(mac)
    }

    pub fn num_devices(&self) -> usize {
        self.inner.store.device_count()
    }

    /// Alert log, newest first.
    pub fn alerts(&self) -> Arc<Vec<Alert>> {
        self.inner.store.alerts_snapshot()
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> StateStream<Arc<DeviceMap>> {
        self.inner.store.subscribe_devices()
    }

    pub fn subscribe_alerts(&self) -> StateStream<Arc<Vec<Alert>>> {
        self.inner.store.subscribe_alerts()
    }

    pub fn subscribe_refresh_rate(&self) -> StateStream<RefreshRate> {
        StateStream::new(self.inner.refresh_rate.subscribe())
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("devices_url", &self.inner.devices_url.as_str())
            .field("num_devices", &self.num_devices())
            .field("refresh_rate", &self.refresh_rate())
            .finish_non_exhaustive()
    }
}
