//! Command dispatch: bridges CLI args -> provisioner calls -> output formatting.

pub mod devices;
pub mod watch;

use provisioner_core::Provisioner;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    provisioner: &Provisioner,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(provisioner, args, global).await,
        Command::Watch(args) => watch::handle(provisioner, &args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
