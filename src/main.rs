mod config;
mod error;
mod models;
mod mqtt;
mod processor;

use config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .init();

    info!("Starting RAK10701 Field Tester Bridge...");

    // Listen until interrupted; in-flight messages are abandoned on exit.
    tokio::select! {
        result = mqtt::start_mqtt_client(&config) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, closing connection");
            Ok(())
        }
    }
}
