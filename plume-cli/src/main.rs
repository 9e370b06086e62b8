//! Plume CLI
//!
//! Command-line interface for submitting AERSCREEN, AERSURFACE and AERMOD
//! runs to the analysis API and following them until they settle.

mod commands;
mod config;
mod id_resolver;
mod types;
mod watch;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Environmental model run CLI", long_about = None)]
struct Cli {
    /// Analysis API URL
    #[arg(long, env = "PLUME_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// Pause between status checks while watching a run (milliseconds)
    #[arg(long, env = "PLUME_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Give up watching after this many status checks
    #[arg(long, env = "PLUME_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Per-request timeout (seconds)
    #[arg(long, env = "PLUME_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plume_cli=info,plume_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        max_attempts: cli.max_attempts,
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
