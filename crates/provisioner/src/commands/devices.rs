//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;
use tracing::debug;

use provisioner_core::{CoreError, Device, DeviceAction, DeviceMap, Provisioner};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;
use crate::timefmt;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Config")]
    config: &'static str,
    #[tabled(rename = "Upgrade")]
    upgrade: &'static str,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            mac: d.mac.to_string(),
            hostname: d.hostname.clone().unwrap_or_default(),
            model: d.model.clone().unwrap_or_default(),
            firmware: d.firmware.clone().unwrap_or_default(),
            status: d.status.as_str().to_owned(),
            config: yes_no(d.has_config),
            upgrade: yes_no(d.can_upgrade),
            last_seen: timefmt::ago_or_dash(d.last_seen_at),
        }
    }
}

fn date_or_dash(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(|| "-".into(), |t| timefmt::fmt_date(t.timestamp()))
}

fn detail(d: &Device) -> String {
    let mut lines = vec![
        format!("MAC:        {}", d.mac),
        format!("Hostname:   {}", d.hostname.as_deref().unwrap_or("-")),
        format!(
            "IP:         {}",
            d.ip.map_or_else(|| "-".into(), |ip| ip.to_string())
        ),
        format!("Model:      {}", d.model.as_deref().unwrap_or("-")),
        format!("Platform:   {}", d.platform.as_deref().unwrap_or("-")),
        format!("Firmware:   {}", d.firmware.as_deref().unwrap_or("-")),
        format!("Status:     {}", d.status.as_str()),
        format!("Config:     {}", yes_no(d.has_config)),
        format!("Upgrade:    {}", yes_no(d.can_upgrade)),
    ];
    if let Some(essid) = &d.essid {
        lines.push(format!(
            "Wireless:   {essid} ({})",
            d.wireless_mode.as_deref().unwrap_or("?")
        ));
    }
    for (iface, addrs) in &d.ip_addresses {
        lines.push(format!("  {iface}: {}", addrs.join(", ")));
    }
    lines.push(format!("First seen: {}", date_or_dash(d.first_seen_at)));
    lines.push(format!("Last seen:  {}", date_or_dash(d.last_seen_at)));
    lines.push(format!("Up since:   {}", date_or_dash(d.up_since)));
    lines.join("\n")
}

/// Render the cached devices, MAC-sorted, in the chosen format.
pub fn render_devices(devices: &DeviceMap, format: &OutputFormat) -> Result<String, CliError> {
    let devices: Vec<Arc<Device>> = devices.values().cloned().collect();
    output::render_list(
        format,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.mac.to_string(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    provisioner: &Provisioner,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some((action, mac)) = args.command.action() {
        return run_action(provisioner, action, mac, global).await;
    }

    match args.command {
        DevicesCommand::List => {
            provisioner.wait_for_first_poll().await;
            if let Some(alert) = provisioner.alerts().first().filter(|a| a.is_danger()) {
                return Err(poll_failure(&alert.message));
            }

            let out = render_devices(&provisioner.devices(), global.output_format())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { mac } => {
            let device = provisioner
                .fetch_device(&mac)
                .await
                .map_err(|e| match e {
                    CoreError::TransportError { ref status, .. } if status == "404" => {
                        CoreError::DeviceNotFound { mac: mac.clone() }.into()
                    }
                    other => CliError::from(other),
                })?;
            let out = output::render_single(global.output_format(), &device, detail, |d| {
                d.mac.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // Handled by `run_action` above.
        DevicesCommand::Reboot { .. }
        | DevicesCommand::Provision { .. }
        | DevicesCommand::Upgrade { .. } => Ok(()),
    }
}

async fn run_action(
    provisioner: &Provisioner,
    action: DeviceAction,
    mac: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Validation reads the cache, so it must be populated first.
    provisioner.wait_for_first_poll().await;
    debug!(%action, mac, "performing device action");

    let alert = provisioner.perform_action(action.as_ref(), mac).await;
    if alert.is_danger() {
        return Err(CliError::ActionFailed {
            message: alert.message,
        });
    }
    let color = output::should_color(global.color_mode());
    output::print_output(&output::alert_line(&alert, color), global.quiet);
    Ok(())
}

/// A failed poll leaves its reason as the newest alert.
fn poll_failure(message: &str) -> CliError {
    if message == CoreError::TransportUnreachable.to_string() {
        CliError::Unreachable
    } else {
        CliError::Api {
            message: message.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_shows_placeholders() {
        let text = detail(&Device::new("00:11:22:33:44:55"));
        assert!(text.contains("MAC:        00:11:22:33:44:55"));
        assert!(text.contains("Hostname:   -"));
        assert!(text.contains("Up since:   -"));
    }

    #[test]
    fn poll_failure_maps_unreachable() {
        assert!(matches!(
            poll_failure("Could not connect to server."),
            CliError::Unreachable
        ));
        assert!(matches!(
            poll_failure("500: Internal Server Error"),
            CliError::Api { .. }
        ));
    }
}
