//! Chat session state
//!
//! A single [`Session`] owns the message history, the staged attachment and the
//! turn submitter. Rendering sinks read [`HistoryStore`] snapshots or subscribe
//! to its events.

mod attachment;
mod history;
mod turn;

#[cfg(test)]
pub mod testing;

pub use attachment::{AttachmentError, AttachmentMetadata, AttachmentStaging};
pub use history::{HistoryEvent, HistorySnapshot, HistoryStore, MessageEntry, Role};
pub use turn::{Turn, TurnPhase, TurnSubmitter};

use crate::agent::AgentClient;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Identity of this session and where its turns go. Fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    session_id: String,
    endpoint_url: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, endpoint_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            endpoint_url: endpoint_url.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

pub struct Session {
    context: SessionContext,
    history: Arc<HistoryStore>,
    staging: Arc<AttachmentStaging>,
    submitter: Arc<TurnSubmitter>,
}

impl Session {
    pub fn new(context: SessionContext, client: Arc<dyn AgentClient>, request_timeout: Duration) -> Self {
        let history = Arc::new(HistoryStore::new());
        let staging = Arc::new(AttachmentStaging::new());
        let submitter = Arc::new(TurnSubmitter::new(
            context.clone(),
            history.clone(),
            staging.clone(),
            client,
            request_timeout,
        ));
        Self {
            context,
            history,
            staging,
            submitter,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// File-selection event
    pub fn stage(&self, meta: AttachmentMetadata) {
        tracing::info!(
            name = %meta.name(),
            media_type = %meta.media_type(),
            size = meta.size_bytes(),
            "Attachment staged"
        );
        self.staging.stage(meta);
    }

    pub fn pending_attachment(&self) -> Option<AttachmentMetadata> {
        self.staging.pending()
    }

    /// Submit event
    ///
    /// The turn runs on its own task. Dropping the returned future does not
    /// stop it, so a user entry is always followed by its assistant entry.
    pub async fn submit(&self, raw_text: &str) -> Option<Turn> {
        let submitter = self.submitter.clone();
        let text = raw_text.to_string();
        match tokio::spawn(async move { submitter.submit(&text).await }).await {
            Ok(turn) => turn,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                tracing::error!(error = %e, "Turn task cancelled");
                None
            }
        }
    }

    /// Clear history, then drop any staged attachment.
    ///
    /// Waits for an in-flight turn so its assistant entry cannot land in the
    /// fresh history.
    pub async fn reset(&self) {
        let _exclusive = self.submitter.exclusive().await;
        self.history.reset();
        self.staging.clear();
        tracing::info!(session_id = %self.context.session_id(), "Session history cleared");
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn phase(&self) -> TurnPhase {
        self.submitter.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<TurnPhase> {
        self.submitter.subscribe_phase()
    }
}
