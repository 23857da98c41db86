//! One user turn: bind attachment, record, call the agent, record the reply
//!
//! Per turn the submitter walks
//! `Idle -> UserAppended -> AwaitingRemote -> {Resolved, Failed} -> AssistantAppended -> Idle`.
//! Every accepted submission appends exactly one user entry followed by exactly
//! one assistant entry; failures become assistant text and are never returned.

use super::{AttachmentStaging, HistoryStore, MessageEntry, SessionContext};
use crate::agent::{AgentClient, AgentError, AgentErrorKind, AgentReply, AgentRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::Instrument;
use uuid::Uuid;

/// Shown when the agent answers without a `response` field
pub const FALLBACK_REPLY: &str = "Sorry, I could not process your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    UserAppended,
    AwaitingRemote,
    Resolved,
    Failed,
    AssistantAppended,
}

impl TurnPhase {
    pub fn is_busy(self) -> bool {
        !matches!(self, TurnPhase::Idle)
    }
}

/// The two entries a completed turn appended
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub user: MessageEntry,
    pub assistant: MessageEntry,
    /// `Resolved` or `Failed`
    pub outcome: TurnPhase,
}

/// Assistant text for a failed agent call
pub fn failure_message(err: &AgentError) -> String {
    match err.kind {
        AgentErrorKind::Transport => format!("Error connecting to the agent API: {}", err.message),
        AgentErrorKind::Unexpected => format!("An unexpected error occurred: {}", err.message),
    }
}

pub struct TurnSubmitter {
    context: SessionContext,
    history: Arc<HistoryStore>,
    staging: Arc<AttachmentStaging>,
    client: Arc<dyn AgentClient>,
    request_timeout: Duration,
    /// Held for a whole turn, including the remote call
    turn_lock: Mutex<()>,
    phase: watch::Sender<TurnPhase>,
}

impl TurnSubmitter {
    pub fn new(
        context: SessionContext,
        history: Arc<HistoryStore>,
        staging: Arc<AttachmentStaging>,
        client: Arc<dyn AgentClient>,
        request_timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(TurnPhase::Idle);
        Self {
            context,
            history,
            staging,
            client,
            request_timeout,
            turn_lock: Mutex::new(()),
            phase,
        }
    }

    /// Run one turn. Returns `None` for empty or whitespace-only input.
    pub async fn submit(&self, raw_text: &str) -> Option<Turn> {
        if raw_text.trim().is_empty() {
            tracing::debug!("Ignoring empty submission");
            return None;
        }

        let _turn = self.turn_lock.lock().await;
        let span = tracing::info_span!(
            "turn",
            turn_id = %Uuid::new_v4(),
            session_id = %self.context.session_id()
        );
        Some(self.run_turn(raw_text).instrument(span).await)
    }

    async fn run_turn(&self, raw_text: &str) -> Turn {
        let attachments: Vec<_> = self.staging.take_if_present().into_iter().collect();
        let user = MessageEntry::user(raw_text, attachments);
        self.history.append(user.clone());
        self.set_phase(TurnPhase::UserAppended);

        let request = AgentRequest {
            user_input: raw_text.to_string(),
            session_id: self.context.session_id().to_string(),
            attachments: user.attachments().to_vec(),
        };

        self.set_phase(TurnPhase::AwaitingRemote);
        let (outcome, content) = match self.call_agent(&request).await {
            Ok(reply) => {
                let content = reply.response.unwrap_or_else(|| {
                    tracing::warn!("Agent reply had no response field");
                    FALLBACK_REPLY.to_string()
                });
                (TurnPhase::Resolved, content)
            }
            Err(e) => {
                tracing::warn!(kind = e.kind.as_str(), error = %e.message, "Turn failed");
                (TurnPhase::Failed, failure_message(&e))
            }
        };
        self.set_phase(outcome);

        let assistant = MessageEntry::assistant(content);
        self.history.append(assistant.clone());
        self.set_phase(TurnPhase::AssistantAppended);
        self.set_phase(TurnPhase::Idle);

        Turn {
            user,
            assistant,
            outcome,
        }
    }

    async fn call_agent(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        match tokio::time::timeout(self.request_timeout, self.client.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::transport(format!(
                "Request timed out after {:?}",
                self.request_timeout
            ))),
        }
    }

    fn set_phase(&self, phase: TurnPhase) {
        tracing::debug!(?phase, "Turn phase");
        self.phase.send_replace(phase);
    }

    /// Wait until no turn is in flight and keep others out
    pub(super) async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.turn_lock.lock().await
    }

    pub fn phase(&self) -> TurnPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<TurnPhase> {
        self.phase.subscribe()
    }
}
