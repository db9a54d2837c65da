mod cli;
mod commands;
mod config;
mod error;
mod output;
mod timefmt;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use provisioner_core::Provisioner;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "provisioner", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let file = provisioner_config::load_config_or_default();
            config::apply_defaults(&mut cli.global, &file.defaults)?;
            let cfg = config::build_provisioner_config(&cli.global, &file)?;
            let provisioner = Provisioner::bootstrap(&cfg)
                .await
                .map_err(|e| CliError::bootstrap(&cfg.url, e))?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &provisioner, &cli.global).await;
            provisioner.shutdown();
            result
        }
    }
}
