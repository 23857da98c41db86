//! HTTP implementation of the agent client

use super::error::describe_chain;
use super::{AgentClient, AgentError, AgentReply, AgentRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Cap on how much of an error body is echoed into the chat
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Agent client that POSTs JSON turns to a fixed endpoint
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
}

impl HttpAgentClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::unexpected(format!("Failed to create HTTP client: {}", describe_chain(&e))))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn classify_send_error(err: &reqwest::Error) -> AgentError {
        let detail = describe_chain(err);
        if err.is_timeout() {
            AgentError::transport(format!("Request timeout: {detail}"))
        } else if err.is_connect() {
            AgentError::transport(format!("Connection failed: {detail}"))
        } else if err.is_builder() {
            AgentError::unexpected(format!("Invalid request: {detail}"))
        } else {
            AgentError::transport(format!("Request failed: {detail}"))
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> AgentError {
        let body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
        if body.is_empty() {
            AgentError::transport(format!("HTTP {status}"))
        } else {
            AgentError::transport(format!("HTTP {status}: {body}"))
        }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AgentError::transport(format!("Failed to read response: {}", describe_chain(&e)))
        })?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AgentError::unexpected(format!("Failed to parse response: {e}")))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
