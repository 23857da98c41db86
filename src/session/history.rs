//! Ordered message log and its change notifications

use super::AttachmentMetadata;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One rendered message. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEntry {
    role: Role,
    content: String,
    attachments: Vec<AttachmentMetadata>,
    created_at: DateTime<Utc>,
}

impl MessageEntry {
    pub fn user(content: impl Into<String>, attachments: Vec<AttachmentMetadata>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
            created_at: Utc::now(),
        }
    }

    /// Assistant entries never carry attachments
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachments(&self) -> &[AttachmentMetadata] {
        &self.attachments
    }
}

/// Point-in-time copy of the history
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistorySnapshot {
    pub entries: Vec<MessageEntry>,
    /// Bumped on every append and reset
    pub revision: u64,
}

#[allow(dead_code)] // Used in tests
impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Change notifications for rendering sinks
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    Appended { entry: MessageEntry, revision: u64 },
    Reset { revision: u64 },
}

impl HistoryEvent {
    pub fn revision(&self) -> u64 {
        match self {
            HistoryEvent::Appended { revision, .. } | HistoryEvent::Reset { revision } => *revision,
        }
    }
}

#[derive(Debug, Default)]
struct Log {
    entries: Vec<MessageEntry>,
    revision: u64,
}

/// Append-only (until reset) message log
pub struct HistoryStore {
    log: RwLock<Log>,
    events: broadcast::Sender<HistoryEvent>,
}

impl HistoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            log: RwLock::new(Log::default()),
            events,
        }
    }

    pub fn append(&self, entry: MessageEntry) {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        log.revision += 1;
        log.entries.push(entry.clone());
        // Sent under the lock so subscribers see events in mutation order.
        // No receivers is fine.
        let _ = self.events.send(HistoryEvent::Appended {
            entry,
            revision: log.revision,
        });
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        HistorySnapshot {
            entries: log.entries.clone(),
            revision: log.revision,
        }
    }

    pub fn reset(&self) {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        log.entries.clear();
        log.revision += 1;
        let _ = self.events.send(HistoryEvent::Reset {
            revision: log.revision,
        });
    }

    #[allow(dead_code)] // Used in tests
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Snapshot plus a receiver positioned right after it, with no gap
    pub fn snapshot_and_subscribe(&self) -> (HistorySnapshot, broadcast::Receiver<HistoryEvent>) {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        let rx = self.events.subscribe();
        let snapshot = HistorySnapshot {
            entries: log.entries.clone(),
            revision: log.revision,
        };
        (snapshot, rx)
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
