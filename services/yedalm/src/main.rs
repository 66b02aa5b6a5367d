//! Yedalm CLI
//!
//! Command-line entry point for the community site service.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use yedalm::{load_config, Config};

#[derive(Parser)]
#[command(name = "yedalm")]
#[command(about = "Community site and admin console")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(port) = args.port {
        config.site.port = port;
    }

    tracing::info!("Starting yedalm site");
    tracing::debug!(
        "Backend: {}, bind: {}:{}",
        config.backend.url,
        config.site.bind,
        config.site.port
    );

    yedalm::run(config).await?;

    Ok(())
}
