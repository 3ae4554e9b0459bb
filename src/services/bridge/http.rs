use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

use super::CommandBridge;
use crate::error::AppError;

pub struct HttpBridge {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBridge {
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self, AppError> {
        // The backend is a host-local process; system proxies do not apply.
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn command_url(&self, command: &str) -> String {
        format!("{}/invoke/{}", self.base_url, command)
    }
}

#[async_trait]
impl CommandBridge for HttpBridge {
    #[instrument(skip(self, args))]
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError> {
        let url = self.command_url(command);
        let response = self
            .client
            .post(&url)
            .json(&args)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Backend returned HTTP {}: {}",
                status, body
            )));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid backend response: {}", e)))?;
        tracing::debug!(command, "Response received");
        Ok(value)
    }
}
