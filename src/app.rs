use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::AppError;
use crate::services::bridge::{self, CommandBridge};
use crate::services::gateway::CommandGateway;
use crate::services::session::SessionState;
use crate::services::stager::ImageStager;

/// Everything one UI session needs: the gateway, its session state and the stager.
pub struct AppState {
    bridge: Arc<dyn CommandBridge>,
    pub gateway: CommandGateway,
    pub session: Mutex<SessionState>,
    pub stager: ImageStager,
}

impl AppState {
    pub fn new(bridge: Arc<dyn CommandBridge>, stager: ImageStager) -> Self {
        Self {
            gateway: CommandGateway::new(bridge.clone()),
            bridge,
            session: Mutex::new(SessionState::new()),
            stager,
        }
    }

    pub async fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let bridge = bridge::connect(&config.backend.transport).await?;
        let stager = ImageStager::new(config.staging.resolved_directory());
        tracing::info!(
            staging = %stager.directory().display(),
            "Inference client ready"
        );
        Ok(Self::new(bridge, stager))
    }

    /// Stops the backend transport and removes staged temp files.
    /// The session itself is not persisted.
    pub async fn shutdown(&self) {
        self.bridge.shutdown().await;
        self.stager.cleanup().await;
    }
}
