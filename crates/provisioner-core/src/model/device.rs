// ── Device domain types ──

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address as spelled by the server.
///
/// Used verbatim as the device key: comparison is case-sensitive and no
/// normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MacAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MacAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── DeviceStatus ────────────────────────────────────────────────────

/// What the provisioner is currently doing with a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    #[default]
    Idle,
    Upgrading,
    Provisioning,
    Rebooting,
    /// A status string this client does not know about.
    Other(String),
}

impl DeviceStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Upgrading | Self::Provisioning)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Upgrading => "upgrading",
            Self::Provisioning => "provisioning",
            Self::Rebooting => "rebooting",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DeviceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "idle" => Self::Idle,
            "upgrading" => Self::Upgrading,
            "provisioning" => Self::Provisioning,
            "rebooting" => Self::Rebooting,
            _ => Self::Other(s),
        }
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        match status {
            DeviceStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Device ──────────────────────────────────────────────────────────

/// A device known to the provisioner.
///
/// Replaced wholesale on every poll; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub mac: MacAddress,
    /// A configuration is available for provisioning.
    pub has_config: bool,
    /// A firmware image is available for upgrading.
    pub can_upgrade: bool,
    pub hostname: Option<String>,
    pub model: Option<String>,
    pub platform: Option<String>,
    pub firmware: Option<String>,
    pub essid: Option<String>,
    pub wireless_mode: Option<String>,
    pub ip: Option<IpAddr>,
    /// Interface MAC -> addresses bound to it.
    pub ip_addresses: BTreeMap<String, Vec<String>>,
    pub status: DeviceStatus,
    pub first_seen_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub up_since: Option<DateTime<Utc>>,
    /// Server fields without a typed counterpart.
    pub extra: serde_json::Map<String, Value>,
}

impl Device {
    /// A device with only its key set.
    pub fn new(mac: impl Into<MacAddress>) -> Self {
        Self {
            mac: mac.into(),
            has_config: false,
            can_upgrade: false,
            hostname: None,
            model: None,
            platform: None,
            firmware: None,
            essid: None,
            wireless_mode: None,
            ip: None,
            ip_addresses: BTreeMap::new(),
            status: DeviceStatus::default(),
            first_seen_at: None,
            last_seen_at: None,
            up_since: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Hostname if known, otherwise the MAC address.
    pub fn display_name(&self) -> &str {
        self.hostname
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.mac.as_str())
    }
}
