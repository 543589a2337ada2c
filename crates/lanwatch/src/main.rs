mod cli;
mod commands;
mod error;
mod poller;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::DaemonError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.json_logs);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "info",
        1 => "lanwatch=debug,lanwatch_core=debug,lanwatch_api=debug,info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so command output on stdout stays parseable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), DaemonError> {
    let command = cli.command.unwrap_or(Command::Run);
    let ctx = Context::build(&cli.global).await?;

    tracing::debug!(command = ?command, "dispatching command");
    commands::dispatch(command, ctx).await
}
