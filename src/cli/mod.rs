//! CLI module — command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

mod agent;
mod common;
mod logs;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use redpulse::config::Config;
use redpulse::utils::init_logging;

#[derive(Parser)]
#[command(name = "redpulse")]
#[command(version)]
#[command(about = "Research agent blending news search with Reddit sentiment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the research agent (interactive unless -m is given)
    Agent {
        /// Direct question to answer (non-interactive mode)
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Inspect recorded runs
    Logs {
        /// Number of recent runs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Show aggregate statistics instead of a listing
        #[arg(long)]
        stats: bool,
    },
    /// Show version information
    Version,
}

/// Parse arguments and dispatch to the command handlers.
pub async fn run() -> Result<()> {
    // .env first, so credentials and overrides are visible to config loading.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load().with_context(|| "Failed to load configuration")?;
    init_logging(&config.logging);

    match cli.command {
        Some(Commands::Agent { message }) => agent::cmd_agent(config, message).await,
        Some(Commands::Logs { limit, stats }) => logs::cmd_logs(config, limit, stats),
        Some(Commands::Version) => {
            println!("redpulse {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        // No subcommand: interactive agent mode.
        None => agent::cmd_agent(config, None).await,
    }
}
