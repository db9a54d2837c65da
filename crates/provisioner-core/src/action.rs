// ── Device actions ──
//
// The three control operations a device accepts, and the device-side
// preconditions each one carries.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::model::Device;

/// A control operation that can be dispatched to a device.
///
/// Parsing is case-sensitive: only `reboot`, `provision` and `upgrade`
/// are recognized.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceAction {
    Reboot,
    Provision,
    Upgrade,
}

impl DeviceAction {
    /// Name of the URL directory entry serving this action.
    pub fn endpoint_name(self) -> &'static str {
        match self {
            Self::Reboot => "reboot_device",
            Self::Provision => "provision_device",
            Self::Upgrade => "upgrade_device",
        }
    }

    /// The device capability this action requires, if any.
    pub fn precondition(self) -> Option<Precondition> {
        match self {
            Self::Reboot => None,
            Self::Provision => Some(Precondition::Configuration),
            Self::Upgrade => Some(Precondition::FirmwareUpgrade),
        }
    }
}

/// A device capability required before an action may be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Precondition {
    /// The server holds a configuration for the device.
    #[strum(serialize = "configuration")]
    Configuration,
    /// The server holds a firmware image the device can upgrade to.
    #[strum(serialize = "firmware upgrade")]
    FirmwareUpgrade,
}

impl Precondition {
    pub fn is_met(self, device: &Device) -> bool {
        match self {
            Self::Configuration => device.has_config,
            Self::FirmwareUpgrade => device.can_upgrade,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!("reboot".parse::<DeviceAction>().unwrap(), DeviceAction::Reboot);
        assert_eq!("upgrade".parse::<DeviceAction>().unwrap(), DeviceAction::Upgrade);
        assert!("Reboot".parse::<DeviceAction>().is_err());
        assert!("explode".parse::<DeviceAction>().is_err());
    }

    #[test]
    fn endpoint_names_follow_action_name() {
        for action in DeviceAction::iter() {
            assert_eq!(action.endpoint_name(), format!("{action}_device"));
        }
    }

    #[test]
    fn only_reboot_is_unconditional() {
        assert_eq!(DeviceAction::Reboot.precondition(), None);
        assert_eq!(
            DeviceAction::Provision.precondition(),
            Some(Precondition::Configuration)
        );
        assert_eq!(
            DeviceAction::Upgrade.precondition(),
            Some(Precondition::FirmwareUpgrade)
        );
    }
}
