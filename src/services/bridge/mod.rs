//! Transport seam between the client and the inference backend.
//!
//! A bridge only moves `(command, args)` to the backend and a JSON value back.
//! Typing and failure normalization happen in the gateway.

pub mod http;
pub mod sidecar;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::AppError;
use crate::models::inference_types::{BackendCommand, InferenceResponse, ResponseEnvelope};

#[async_trait]
pub trait CommandBridge: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError>;

    /// Releases whatever the transport holds open. Stateless transports have nothing to do.
    async fn shutdown(&self) {}
}

/// Sends one typed command and decodes the reply.
pub async fn invoke_command<C: BackendCommand>(
    bridge: &dyn CommandBridge,
    request: &C,
) -> Result<InferenceResponse, AppError> {
    let args = serde_json::to_value(request)?;
    let raw = bridge.invoke(C::NAME, args).await?;
    let envelope: ResponseEnvelope = serde_json::from_value(raw)?;
    Ok(envelope.into())
}

pub async fn connect(transport: &TransportConfig) -> Result<Arc<dyn CommandBridge>, AppError> {
    match transport {
        TransportConfig::Sidecar { program, args } => {
            let bridge = sidecar::SidecarBridge::spawn(program, args).await?;
            Ok(Arc::new(bridge))
        }
        TransportConfig::Http {
            base_url,
            timeout_secs,
        } => {
            let bridge = http::HttpBridge::new(base_url, *timeout_secs)?;
            Ok(Arc::new(bridge))
        }
    }
}
