//! Offline agent that acknowledges each turn without a network call

use super::{AgentClient, AgentError, AgentReply, AgentRequest};
use async_trait::async_trait;
use std::time::Duration;

pub const SIMULATED_ENDPOINT: &str = "simulated://agent";

/// Answers every request locally after a short delay.
///
/// Used when no agent service is available (`AGENT_SIMULATE=1`).
pub struct SimulatedAgentClient {
    delay: Duration,
}

impl SimulatedAgentClient {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn reply_for(request: &AgentRequest) -> String {
        if request.attachments.is_empty() {
            format!(
                "(Simulated) Received your message: '{}'. How can I help?",
                request.user_input
            )
        } else {
            let names = request
                .attachments
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "(Simulated) Received your message: '{}' and file(s): {names}. I would process them now.",
                request.user_input
            )
        }
    }
}

impl Default for SimulatedAgentClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl AgentClient for SimulatedAgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        tokio::time::sleep(self.delay).await;
        Ok(AgentReply::text(Self::reply_for(request)))
    }

    fn endpoint(&self) -> &str {
        SIMULATED_ENDPOINT
    }
}
