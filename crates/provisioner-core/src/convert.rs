// ── API-to-domain type conversions ──
//
// Bridges raw `provisioner_api` records into `provisioner_core::model`
// types. Empty strings become `None`, timestamps are parsed into
// `DateTime<Utc>`, and the IP address string into `IpAddr`.

use std::net::IpAddr;

use chrono::{DateTime, Utc};

use provisioner_api::DeviceRecord;

use crate::model::{Device, DeviceStatus, MacAddress};

// ── Helpers ────────────────────────────────────────────────────────

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

fn parse_ip(raw: Option<&str>) -> Option<IpAddr> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Epoch seconds to `DateTime<Utc>`. The server reports "never" as 0.
fn epoch_to_datetime(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    epoch
        .filter(|ts| *ts > 0)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

// ── Device ─────────────────────────────────────────────────────────

impl From<DeviceRecord> for Device {
    fn from(r: DeviceRecord) -> Self {
        let ip = parse_ip(r.ip_address.as_deref());
        Self {
            mac: MacAddress::new(r.mac_address),
            has_config: r.has_config,
            can_upgrade: r.can_upgrade,
            hostname: non_empty(r.hostname),
            model: non_empty(r.model),
            platform: non_empty(r.platform),
            firmware: non_empty(r.firmware),
            essid: non_empty(r.essid),
            wireless_mode: non_empty(r.wireless_mode),
            ip,
            ip_addresses: r.ip_addresses.into_iter().collect(),
            status: non_empty(r.status).map(DeviceStatus::from).unwrap_or_default(),
            first_seen_at: epoch_to_datetime(r.first_seen_at),
            last_seen_at: epoch_to_datetime(r.last_seen_at),
            up_since: epoch_to_datetime(r.up_since),
            extra: r.extra,
        }
    }
}
