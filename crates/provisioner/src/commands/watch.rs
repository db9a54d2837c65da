//! `watch`: re-render the device table and alert log on every change.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use tracing::{debug, info};

use provisioner_core::{Alert, DeviceMap, Provisioner};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::devices;

pub async fn handle(
    provisioner: &Provisioner,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(rate) = args.refresh {
        provisioner.set_refresh_rate(rate)?;
    }

    let mut device_updates = provisioner.subscribe_devices();
    let mut alert_updates = provisioner.subscribe_alerts();
    let color = output::should_color(global.color_mode());
    let clear =
        matches!(global.output_format(), OutputFormat::Table) && io::stdout().is_terminal();

    provisioner.wait_for_first_poll().await;
    render(provisioner, &provisioner.devices(), &provisioner.alerts(), global, color, clear)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping watch");
                break;
            }
            update = device_updates.changed() => {
                let Some(devices) = update else { break };
                debug!(count = devices.len(), "device list changed");
                render(provisioner, &devices, alert_updates.current(), global, color, clear)?;
            }
            update = alert_updates.changed() => {
                let Some(alerts) = update else { break };
                render(provisioner, device_updates.current(), &alerts, global, color, clear)?;
            }
        }
    }

    Ok(())
}

fn render(
    provisioner: &Provisioner,
    devices: &Arc<DeviceMap>,
    alerts: &Arc<Vec<Alert>>,
    global: &GlobalOpts,
    color: bool,
    clear: bool,
) -> Result<(), CliError> {
    if global.quiet {
        return Ok(());
    }
    let body = devices::render_devices(devices, global.output_format())?;

    if clear {
        // ANSI: clear screen, cursor home.
        print!("\x1b[2J\x1b[H");
    }
    if matches!(global.output_format(), OutputFormat::Table) {
        println!(
            "{} device(s), refresh {}",
            devices.len(),
            provisioner.refresh_rate_human()
        );
    }
    output::print_output(&body, false);
    for alert in alerts.iter() {
        eprintln!("{}", output::alert_line(alert, color));
    }
    Ok(())
}
