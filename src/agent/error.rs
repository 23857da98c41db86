//! Agent call error types

use std::error::Error as StdError;
use thiserror::Error;

/// Failure of a single remote agent call, with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Transport, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Unexpected, message)
    }
}

/// Error classification for how a failed turn is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    /// Endpoint unreachable, timed out, or answered with a failure status
    Transport,
    /// Anything else: bad request URL, malformed body
    Unexpected,
}

impl AgentErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Flatten an error and its `source()` chain into `outer: inner: root`.
///
/// reqwest hides the OS-level cause ("Connection refused") behind a generic
/// top-level message, so the chain is needed for a useful detail string.
pub fn describe_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
