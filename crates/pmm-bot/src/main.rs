//! Perp market-making bot - entry point.
//!
//! Replays snapshots from the configured data directory every cycle and
//! logs the resulting ladder or flatten instead of submitting it.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use pmm_bot::{AppConfig, Application, DryRunSubmitter, ReplaySource};

/// Perp market-making bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PMM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the replay data directory
    #[arg(long)]
    data_dir: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pmm_telemetry::init_logging()?;

    info!("Starting pmm-bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > PMM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PMM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = AppConfig::from_file(&config_path)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir.into();
    }
    if args.once {
        config.max_cycles = Some(1);
    }
    info!(
        market = %config.market_name,
        strategy = config.strategy.name(),
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let source = Arc::new(ReplaySource::new(config.data_dir.clone()));
    let submitter = Arc::new(DryRunSubmitter::new());

    let mut app = Application::new(config, source, submitter.clone())?;
    let summary = app.run().await?;

    info!(
        cycles = summary.cycles,
        batches = submitter.batch_count(),
        "Run complete"
    );

    Ok(())
}
