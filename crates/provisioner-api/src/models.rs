// Wire types for the provisioner API.
//
// These mirror the JSON exactly as the server emits it. Conversion into
// domain types happens in provisioner-core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A device as returned by `GET /api/devices` and `GET /api/devices/{mac}`.
///
/// Only `mac_address` is required. The server's known fields are typed;
/// anything else is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub mac_address: String,
    #[serde(default)]
    pub has_config: bool,
    #[serde(default)]
    pub can_upgrade: bool,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub firmware: Option<String>,
    #[serde(default)]
    pub essid: Option<String>,
    #[serde(default)]
    pub wireless_mode: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Interface MAC -> addresses bound to it.
    #[serde(default)]
    pub ip_addresses: HashMap<String, Vec<String>>,
    /// `idle`, `upgrading`, `provisioning`, `rebooting`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub first_seen_at: Option<i64>,
    #[serde(default)]
    pub last_seen_at: Option<i64>,
    #[serde(default)]
    pub up_since: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Result payload of an action endpoint: `{"type": "...", "message": "..."}`.
///
/// Also used by the server for error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_device_defaults_flags() {
        let dev: DeviceRecord = serde_json::from_value(json!({ "mac_address": "b" })).unwrap();
        assert_eq!(dev.mac_address, "b");
        assert!(!dev.has_config);
        assert!(!dev.can_upgrade);
        assert!(dev.extra.is_empty());
    }

    #[test]
    fn unknown_fields_are_kept() {
        let dev: DeviceRecord = serde_json::from_value(json!({
            "mac_address": "04:18:d6:00:00:01",
            "has_config": true,
            "hostname": "ap-lobby",
            "antenna_gain": 3
        }))
        .unwrap();
        assert!(dev.has_config);
        assert_eq!(dev.hostname.as_deref(), Some("ap-lobby"));
        assert_eq!(dev.extra.get("antenna_gain"), Some(&json!(3)));
    }

    #[test]
    fn action_response_uses_type_key() {
        let resp: ActionResponse =
            serde_json::from_value(json!({ "type": "success", "message": "Rebooting device a." }))
                .unwrap();
        assert_eq!(resp.kind, "success");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "type": "success", "message": "Rebooting device a." })
        );
    }
}
