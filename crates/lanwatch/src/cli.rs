//! Command-line surface (clap derive).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "lanwatch",
    version,
    about = "Watch a UniFi controller for new devices",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, short = 'c', global = true, env = "LANWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the controller until interrupted
    Run,

    /// Run a single poll and exit
    Poll,

    /// List recorded devices (unacknowledged only by default)
    Devices {
        /// Include acknowledged devices
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Acknowledge one or more devices
    Ack {
        #[arg(required = true, value_name = "MAC")]
        macs: Vec<String>,
    },

    /// Show acknowledgment counters
    Stats,

    /// List clients blocked at the controller
    Blocked,

    /// Block clients at the controller
    Block {
        #[arg(required = true, value_name = "MAC")]
        macs: Vec<String>,
    },

    /// Unblock clients at the controller
    Unblock {
        #[arg(required = true, value_name = "MAC")]
        macs: Vec<String>,
    },
}
