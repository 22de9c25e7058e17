//! CLI for the Milight bridge.
//!
//! Connects to the MQTT hub broker and logs every decoded channel update
//! until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use milight_bridge::bridge::{Bridge, LoggingSink};
use milight_bridge::config::load_config_from;
use milight_bridge::transport::MqttTransport;
use milight_bridge::utils::error::BridgeError;
use milight_bridge::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "milight-bridge", version, about)]
struct Cli {
    /// Directory holding `default.toml`
    #[arg(long, default_value = "config")]
    config: PathBuf,
    /// Overrides `bridge.log_level`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    if let Err(e) = run(cli).await {
        error!("Bridge failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BridgeError> {
    let settings = match load_config_from(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            logging::init(cli.log_level.as_deref().unwrap_or("info"));
            return Err(e.into());
        }
    };
    logging::init(cli.log_level.as_deref().unwrap_or(&settings.bridge.log_level));

    let (transport, events) = MqttTransport::connect(&settings.mqtt, &settings.bridge.id);
    let bridge = Bridge::start(settings, Arc::new(transport), events, Arc::new(LoggingSink));

    let mut status = bridge.status();
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                info!("Bridge status: {:?}", *status.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Exiting gracefully.");
                break;
            }
        }
    }

    bridge.shutdown().await?;
    Ok(())
}
