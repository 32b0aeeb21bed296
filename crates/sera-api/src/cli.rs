//! CLI definitions for the `sera` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Relay chat messages to Gemini with per-user conversation memory.
#[derive(Parser)]
#[command(name = "sera", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "SERA_CONFIG", default_value = "sera.toml")]
    pub config: PathBuf,

    /// Suppress all log output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP relay.
    Serve {
        /// Address to bind (overrides config and HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT).
        #[arg(long, short)]
        port: Option<u16>,

        /// Export spans through OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Print the resolved configuration as JSON (API key redacted).
    CheckConfig,
}
