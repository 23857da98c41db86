//! Wire types for the remote agent endpoint

use crate::session::AttachmentMetadata;
use serde::{Deserialize, Serialize};

/// Body of one outbound turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub user_input: String,
    pub session_id: String,
    pub attachments: Vec<AttachmentMetadata>,
}

/// Decoded reply from the agent.
///
/// `response` is optional on the wire; a missing or null field is not an
/// error, the caller substitutes its fallback text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub response: Option<String>,
}

impl AgentReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn empty() -> Self {
        Self { response: None }
    }
}
