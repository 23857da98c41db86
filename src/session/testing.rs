//! Mock agent clients for testing
//!
//! These mocks let the session run full turns without a network.

use crate::agent::{AgentClient, AgentError, AgentReply, AgentRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const MOCK_ENDPOINT: &str = "mock://agent";

// ============================================================================
// Mock Agent Client
// ============================================================================

/// Mock client that returns queued results
pub struct MockAgentClient {
    responses: Mutex<VecDeque<Result<AgentReply, AgentError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AgentRequest>>,
}

#[allow(dead_code)]
impl MockAgentClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: AgentReply) {
        self.responses.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_reply(AgentReply::text(text));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::transport("No mock response queued")))
    }
}

impl Default for MockAgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        self.next(request)
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}

// ============================================================================
// Delayed Mock Agent Client (for timeout testing)
// ============================================================================

pub struct DelayedAgentClient {
    pub inner: MockAgentClient,
    delay: Duration,
}

impl DelayedAgentClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockAgentClient::new(),
            delay,
        }
    }
}

#[async_trait]
impl AgentClient for DelayedAgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        tokio::time::sleep(self.delay).await;
        self.inner.next(request)
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}

// ============================================================================
// Gated Mock Agent Client (holds the call open until released)
// ============================================================================

pub struct GatedAgentClient {
    pub inner: MockAgentClient,
    gate: Semaphore,
}

impl GatedAgentClient {
    pub fn new() -> Self {
        Self {
            inner: MockAgentClient::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Let one pending (or future) call through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl AgentClient for GatedAgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<AgentReply, AgentError> {
        self.gate.acquire().await.unwrap().forget();
        self.inner.next(request)
    }

    fn endpoint(&self) -> &str {
        MOCK_ENDPOINT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::turn::FALLBACK_REPLY;
    use crate::session::{
        AttachmentMetadata, HistoryEvent, MessageEntry, Role, Session, SessionContext, TurnPhase,
    };
    use std::sync::Arc;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn context() -> SessionContext {
        SessionContext::new("test-session", MOCK_ENDPOINT)
    }

    fn session_with(client: Arc<dyn AgentClient>) -> Arc<Session> {
        Arc::new(Session::new(context(), client, TIMEOUT))
    }

    fn report_pdf() -> AttachmentMetadata {
        AttachmentMetadata::new("report.pdf", "application/pdf", 2048).unwrap()
    }

    fn assert_entry(entry: &MessageEntry, role: Role, content: &str, attachments: &[AttachmentMetadata]) {
        assert_eq!(entry.role(), role);
        assert_eq!(entry.content(), content);
        assert_eq!(entry.attachments(), attachments);
    }

    #[tokio::test]
    async fn test_staged_attachment_binds_to_next_message() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("Done");
        let session = session_with(mock.clone());

        session.stage(report_pdf());
        session.submit("Summarize this").await.unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_entry(&snapshot.entries[0], Role::User, "Summarize this", &[report_pdf()]);
        assert_eq!(session.pending_attachment(), None);

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_input, "Summarize this");
        assert_eq!(requests[0].session_id, "test-session");
        assert_eq!(requests[0].attachments, vec![report_pdf()]);
    }

    #[tokio::test]
    async fn test_submit_without_attachment() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("Hi there");
        let session = session_with(mock.clone());

        session.submit("Hello").await.unwrap();

        let snapshot = session.snapshot();
        assert_entry(&snapshot.entries[0], Role::User, "Hello", &[]);
        assert!(mock.recorded_requests()[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_attachment_consumed_once() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("first");
        mock.queue_text("second");
        let session = session_with(mock.clone());

        session.stage(report_pdf());
        session.submit("T1").await.unwrap();
        session.submit("T2").await.unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_entry(&snapshot.entries[0], Role::User, "T1", &[report_pdf()]);
        assert_entry(&snapshot.entries[2], Role::User, "T2", &[]);
    }

    #[tokio::test]
    async fn test_attachment_consumed_even_when_call_fails() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_error(AgentError::transport("down"));
        let session = session_with(mock.clone());

        session.stage(report_pdf());
        session.submit("try").await.unwrap();

        assert_eq!(session.pending_attachment(), None);
        assert_entry(&session.snapshot().entries[0], Role::User, "try", &[report_pdf()]);
    }

    #[tokio::test]
    async fn test_each_turn_appends_user_then_assistant() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("a");
        mock.queue_error(AgentError::unexpected("b"));
        mock.queue_reply(AgentReply::empty());
        let session = session_with(mock.clone());

        for text in ["one", "two", "three"] {
            let before = session.snapshot().len();
            let turn = session.submit(text).await.unwrap();
            let snapshot = session.snapshot();
            assert_eq!(snapshot.len(), before + 2);
            assert_eq!(snapshot.entries[before].role(), Role::User);
            assert_eq!(snapshot.entries[before + 1].role(), Role::Assistant);
            assert_eq!(turn.assistant.content(), snapshot.entries[before + 1].content());
        }
    }

    #[tokio::test]
    async fn test_user_entry_visible_before_reply() {
        let gated = Arc::new(GatedAgentClient::new());
        gated.inner.queue_text("late reply");
        let session = session_with(gated.clone());
        let mut events = session.history().subscribe();

        let handle = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("Hello").await })
        };

        match events.recv().await.unwrap() {
            HistoryEvent::Appended { entry, .. } => assert_eq!(entry.role(), Role::User),
            other => panic!("Expected user append, got {other:?}"),
        }
        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_entry(&snapshot.entries[0], Role::User, "Hello", &[]);
        assert!(session.phase().is_busy());

        gated.release();
        handle.await.unwrap().unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_entry(&snapshot.entries[1], Role::Assistant, "late reply", &[]);
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_reset_clears_history_and_staging() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("ok");
        let session = session_with(mock.clone());

        session.submit("Hello").await.unwrap();
        session.stage(report_pdf());
        session.reset().await;

        assert!(session.snapshot().is_empty());
        assert_eq!(session.pending_attachment(), None);
    }

    #[tokio::test]
    async fn test_reset_waits_for_in_flight_turn() {
        let gated = Arc::new(GatedAgentClient::new());
        gated.inner.queue_text("reply");
        let session = session_with(gated.clone());
        let mut events = session.history().subscribe();

        let submit = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("Hello").await })
        };
        // User entry is in; the turn is now parked on the gate.
        events.recv().await.unwrap();

        let reset = {
            let session = session.clone();
            tokio::spawn(async move { session.reset().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(session.snapshot().len(), 1);

        gated.release();
        submit.await.unwrap().unwrap();
        reset.await.unwrap();

        assert!(session.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_empty_submit_is_noop() {
        let mock = Arc::new(MockAgentClient::new());
        let session = session_with(mock.clone());
        session.stage(report_pdf());
        let revision = session.snapshot().revision;

        assert!(session.submit("").await.is_none());
        assert!(session.submit("   \t\n").await.is_none());

        let snapshot = session.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.revision, revision);
        assert_eq!(session.pending_attachment(), Some(report_pdf()));
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_turn() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_error(AgentError::transport("ECONNREFUSED"));
        let session = session_with(mock.clone());

        session.stage(report_pdf());
        session.submit("Summarize this").await.unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_entry(&snapshot.entries[0], Role::User, "Summarize this", &[report_pdf()]);
        assert_eq!(snapshot.entries[1].role(), Role::Assistant);
        assert!(snapshot.entries[1].content().contains("ECONNREFUSED"));
        assert!(snapshot.entries[1].attachments().is_empty());
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("Hi there");
        let session = session_with(mock.clone());

        let turn = session.submit("Hello").await.unwrap();
        assert_eq!(turn.outcome, TurnPhase::Resolved);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_entry(&snapshot.entries[0], Role::User, "Hello", &[]);
        assert_entry(&snapshot.entries[1], Role::Assistant, "Hi there", &[]);
    }

    #[tokio::test]
    async fn test_missing_response_uses_fallback() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_reply(AgentReply::empty());
        let session = session_with(mock.clone());

        let turn = session.submit("Hello").await.unwrap();
        assert_eq!(turn.assistant.content(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_unexpected_error_message() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_error(AgentError::unexpected("Failed to parse response"));
        let session = session_with(mock.clone());

        let turn = session.submit("Hello").await.unwrap();
        assert_eq!(
            turn.assistant.content(),
            "An unexpected error occurred: Failed to parse response"
        );
    }

    #[tokio::test]
    async fn test_timeout_is_transport_failure() {
        let slow = Arc::new(DelayedAgentClient::new(Duration::from_secs(10)));
        slow.inner.queue_text("too late");
        let session = Arc::new(Session::new(context(), slow.clone(), Duration::from_millis(20)));

        let turn = session.submit("Hello").await.unwrap();
        assert!(turn
            .assistant
            .content()
            .starts_with("Error connecting to the agent API: Request timed out"));
        assert_eq!(session.snapshot().len(), 2);
        assert_eq!(session.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_session_usable_after_failure() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_error(AgentError::transport("down"));
        mock.queue_text("back up");
        let session = session_with(mock.clone());

        session.submit("first").await.unwrap();
        let turn = session.submit("retry").await.unwrap();
        assert_eq!(turn.assistant.content(), "back up");
        assert_eq!(session.snapshot().len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_submits_do_not_interleave() {
        let slow = Arc::new(DelayedAgentClient::new(Duration::from_millis(10)));
        for _ in 0..4 {
            slow.inner.queue_text("ok");
        }
        let session = session_with(slow.clone());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let session = session.clone();
                tokio::spawn(async move { session.submit(&format!("msg {i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), 8);
        for pair in snapshot.entries.chunks(2) {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[1].role(), Role::Assistant);
        }
    }

    #[tokio::test]
    async fn test_restaging_replaces_pending() {
        let mock = Arc::new(MockAgentClient::new());
        mock.queue_text("ok");
        let session = session_with(mock.clone());
        let notes = AttachmentMetadata::new("notes.md", "text/markdown", 12).unwrap();

        session.stage(report_pdf());
        session.stage(notes.clone());
        session.submit("which file?").await.unwrap();

        assert_entry(&session.snapshot().entries[0], Role::User, "which file?", &[notes]);
    }

    #[tokio::test]
    async fn test_phases_on_failed_turn() {
        let gated = Arc::new(GatedAgentClient::new());
        gated.inner.queue_error(AgentError::transport("ECONNREFUSED"));
        let session = session_with(gated.clone());
        let mut phases = session.subscribe_phase();
        assert_eq!(*phases.borrow_and_update(), TurnPhase::Idle);

        let submit = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("Hello").await })
        };

        phases
            .wait_for(|phase| *phase == TurnPhase::AwaitingRemote)
            .await
            .unwrap();
        assert!(session.phase().is_busy());
        assert_eq!(session.snapshot().len(), 1);

        gated.release();
        let turn = submit.await.unwrap().unwrap();
        assert_eq!(turn.outcome, TurnPhase::Failed);
        assert!(turn.assistant.content().contains("ECONNREFUSED"));

        phases.wait_for(|phase| *phase == TurnPhase::Idle).await.unwrap();
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_completes_turn() {
        let gated = Arc::new(GatedAgentClient::new());
        gated.inner.queue_text("still here");
        let session = session_with(gated.clone());
        let mut events = session.history().subscribe();

        let caller = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("Hello").await })
        };
        match events.recv().await.unwrap() {
            HistoryEvent::Appended { entry, .. } => assert_eq!(entry.role(), Role::User),
            other => panic!("Expected user append, got {other:?}"),
        }

        // The caller goes away while the agent call is still pending.
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        gated.release();

        match events.recv().await.unwrap() {
            HistoryEvent::Appended { entry, .. } => {
                assert_entry(&entry, Role::Assistant, "still here", &[]);
            }
            other => panic!("Expected assistant append, got {other:?}"),
        }
        assert_eq!(session.snapshot().len(), 2);
    }
}
