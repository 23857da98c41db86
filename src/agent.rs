//! Remote agent abstraction
//!
//! The session talks to the agent service only through [`AgentClient`].

mod error;
mod http;
mod simulated;
mod types;

pub use error::{AgentError, AgentErrorKind};
pub use http::HttpAgentClient;
pub use simulated::SimulatedAgentClient;
pub use types::{AgentReply, AgentRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for agent endpoints
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send one turn and wait for the reply
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError>;

    /// Where requests go, for logging and the session info route
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: AgentClient + ?Sized> AgentClient for Arc<T> {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        (**self).send(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

/// Logging wrapper for agent clients
pub struct LoggingClient {
    inner: Arc<dyn AgentClient>,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn AgentClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AgentClient for LoggingClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    attachments = request.attachments.len(),
                    has_response = reply.response.is_some(),
                    "Agent request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.inner.endpoint(),
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Agent request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}
