//! API request and response types

use crate::session::{AttachmentMetadata, Turn, TurnPhase};
use serde::{Deserialize, Serialize};

/// File-selection event. `type` is guessed from the name when omitted.
#[derive(Debug, Deserialize)]
pub struct StageAttachmentRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    pub size: u64,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for chat action; `turn` is absent when the text was blank
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub accepted: bool,
    pub turn: Option<Turn>,
}

#[derive(Debug, Serialize)]
pub struct SessionInfoResponse {
    pub session_id: String,
    pub endpoint_url: String,
    pub phase: TurnPhase,
    pub busy: bool,
    pub pending_attachment: Option<AttachmentMetadata>,
}

#[derive(Debug, Serialize)]
pub struct PendingAttachmentResponse {
    pub pending_attachment: Option<AttachmentMetadata>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
