//! Clap derive structures for the `provisioner` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use provisioner_core::{DeviceAction, RefreshRate};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// provisioner -- list, watch and control devices on a provisioning server
#[derive(Debug, Parser)]
#[command(
    name = "provisioner",
    version,
    about = "Poll and control devices on a provisioning server",
    long_about = "Talks to a provisioning server through the URL directory it\n\
        publishes, lists the devices it knows about, and triggers reboot,\n\
        provision and firmware upgrade actions.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "PROVISIONER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'u', env = "PROVISIONER_URL", global = true)]
    pub url: Option<String>,

    /// Output format [default: config `defaults.output`, else table]
    #[arg(long, short = 'o', env = "PROVISIONER_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: config `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PROVISIONER_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PROVISIONER_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The selected output format.
    pub fn output_format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    /// The selected color mode.
    pub fn color_mode(&self) -> &ColorMode {
        self.color.as_ref().unwrap_or(&ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, inspect and control devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Continuously render devices and alerts
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices known to the server
    #[command(alias = "ls")]
    List,

    /// Show one device, fetched fresh from the server
    Show {
        /// Device MAC address (case-sensitive)
        mac: String,
    },

    /// Reboot a device
    Reboot {
        /// Device MAC address (case-sensitive)
        mac: String,
    },

    /// Push the stored configuration to a device
    Provision {
        /// Device MAC address (case-sensitive)
        mac: String,
    },

    /// Flash the available firmware image onto a device
    Upgrade {
        /// Device MAC address (case-sensitive)
        mac: String,
    },
}

impl DevicesCommand {
    /// The action and target for the action subcommands.
    pub fn action(&self) -> Option<(DeviceAction, &str)> {
        match self {
            Self::Reboot { mac } => Some((DeviceAction::Reboot, mac)),
            Self::Provision { mac } => Some((DeviceAction::Provision, mac)),
            Self::Upgrade { mac } => Some((DeviceAction::Upgrade, mac)),
            Self::List | Self::Show { .. } => None,
        }
    }
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Polling rate: a duration (`5s`, `2m`), milliseconds, or `off`.
    /// Defaults to the profile's refresh setting.
    #[arg(long, short = 'r')]
    pub refresh: Option<RefreshRate>,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn action_subcommands_map_to_actions() {
        let cmd = DevicesCommand::Provision { mac: "AA:BB".into() };
        assert_eq!(cmd.action(), Some((DeviceAction::Provision, "AA:BB")));
        assert_eq!(DevicesCommand::List.action(), None);
    }
}
