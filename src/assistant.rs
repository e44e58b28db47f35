use crate::config::Config;
use crate::models::{AssistantReply, AssistantRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, error};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("timed out after {0:?}")] Timeout(Duration),
    #[error("status={status} body={body}")] Status { status: StatusCode, body: String },
    #[error("decode error: {0}")] Decode(String),
}

/// Remote sustainability assistant. Every error means "unavailable".
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Reachability check against the endpoint's base path.
    async fn probe(&self) -> Result<(), AssistantError>;

    /// Sends one chat turn. `Ok(None)` when the reply carries no usable text.
    async fn ask(&self, request: &AssistantRequest) -> Result<Option<String>, AssistantError>;
}

pub struct AssistantClient {
    client: Client,
    chat_url: String,
    probe_url: String,
    probe_timeout: Duration,
}

impl AssistantClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            chat_url: config.api_url.clone(),
            probe_url: config.probe_url(),
            probe_timeout: config.probe_timeout,
        }
    }
}

#[async_trait]
impl Assistant for AssistantClient {
    async fn probe(&self) -> Result<(), AssistantError> {
        info!("🔗 Probing assistant at {}", self.probe_url);
        let response = self.client
            .get(&self.probe_url)
            .header("Content-Type", "application/json")
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { AssistantError::Timeout(self.probe_timeout) } else { AssistantError::Http(e.to_string()) })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Assistant probe returned {}", status);
            return Err(AssistantError::Status { status, body });
        }
        info!("✅ Assistant is available");
        Ok(())
    }

    async fn ask(&self, request: &AssistantRequest) -> Result<Option<String>, AssistantError> {
        info!("📤 Sending message to assistant ({} history entries)", request.history.len());
        let response = self.client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistantError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        let body = response.text().await.map_err(|e| AssistantError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ Assistant error response: {}", body);
            return Err(AssistantError::Status { status, body });
        }

        let parsed: AssistantReply = serde_json::from_str(&body)
            .map_err(|e| AssistantError::Decode(format!("{}: {}", e, body)))?;
        Ok(parsed.response.filter(|text| !text.is_empty()))
    }
}
