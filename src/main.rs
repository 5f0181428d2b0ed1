mod api;
mod app_system;
mod clients;
mod config;
mod domain;
mod error;
mod messages;
mod pos_actor;
mod terminal;
mod view;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;

use tokio::io::BufReader;
use tracing::{error, info};

use crate::api::HttpApi;
use crate::app_system::{setup_tracing, PosSystem};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::load();
    info!(api = %config.api_base_url, "Starting POS terminal");

    let api = HttpApi::from_config(&config).map_err(|e| e.to_string())?;
    let system = PosSystem::start(&config, api)
        .await
        .map_err(|e| e.to_string())?;

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = terminal::run(&system.client, stdin, tokio::io::stdout()).await {
        error!(error = %e, "Terminal I/O failed");
    }

    system.shutdown().await?;

    info!("POS terminal closed");
    Ok(())
}
