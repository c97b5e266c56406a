//! papercard CLI
//!
//! Offline paper wallet generator for Kaspa mainnet.
//!
//! # Usage
//!
//! ```bash
//! # Collect entropy from a noisy source and print a 24-word card
//! head -c 4096 /dev/urandom | papercard generate
//!
//! # 12 words with a passphrase, as JSON
//! papercard generate --words 12 --passphrase "correct horse" --format json < samples.bin
//!
//! # Use backend randomness only
//! papercard generate --skip-entropy
//! ```
//!
//! Nothing is written to disk. Logs go to stderr, the card to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::GenerateCommand;

/// Offline paper wallet generator
#[derive(Parser)]
#[command(name = "papercard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline Kaspa paper wallet generator", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "PAPERCARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a paper wallet
    Generate(GenerateCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Generate(cmd) => cmd.execute(cli.config),
    }
}
