use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::StorefrontApi;
use crate::clients::PosClient;
use crate::config::Config;
use crate::error::PosError;
use crate::pos_actor::PosService;

/// Starts the controller actor, wires it to the API, and stops it again.
pub struct PosSystem {
    pub client: PosClient,
    handle: JoinHandle<()>,
}

impl PosSystem {
    /// Spawns the controller and kicks off the first catalog fetch, the
    /// equivalent of a page load.
    pub async fn start<A: StorefrontApi>(config: &Config, api: A) -> Result<Self, PosError> {
        info!(buffer = config.channel_buffer, "Starting POS system");
        let (service, client) = PosService::new(config.channel_buffer, Arc::new(api));
        let handle = tokio::spawn(service.run());

        client.refresh_catalog().await?;

        Ok(Self { client, handle })
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        self.client.shutdown().await;
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
