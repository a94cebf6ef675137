//! Competition hub server - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Live weightlifting competition hub
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LIFTHUB_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    lifthub_ws::init_crypto();

    let args = Args::parse();

    lifthub_telemetry::init_logging()?;

    info!("Starting lifthub v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > LIFTHUB_CONFIG env var > default
    let config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            lifthub_server::AppConfig::from_file(&path)?
        }
        None => lifthub_server::AppConfig::load()?,
    };

    let app = lifthub_server::Application::new(config)?;
    app.run().await?;

    Ok(())
}
