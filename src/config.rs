//! Process configuration read from the environment

use std::time::Duration;

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8000/api/v1/chat";
pub const DEFAULT_SESSION_ID: &str = "openmanus_chat_session";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8501;

/// Configuration for the chat session and its HTTP surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Agent endpoint (`OPENMANUS_API_URL`)
    pub endpoint_url: String,
    /// Session id sent with every turn (`OPENMANUS_SESSION_ID`)
    pub session_id: String,
    /// Bound on each remote call (`AGENT_TIMEOUT_SECS`)
    pub request_timeout: Duration,
    /// Answer locally instead of calling the endpoint (`AGENT_SIMULATE`)
    pub simulate: bool,
    /// Listen port (`CHAT_PORT`)
    pub port: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            simulate: false,
            port: DEFAULT_PORT,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout = get("AGENT_TIMEOUT_SECS")
            .and_then(|raw| parse_or_warn::<u64>("AGENT_TIMEOUT_SECS", &raw))
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs);

        let port = get("CHAT_PORT")
            .and_then(|raw| parse_or_warn::<u16>("CHAT_PORT", &raw))
            .unwrap_or(defaults.port);

        let simulate = get("AGENT_SIMULATE")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Self {
            endpoint_url: get("OPENMANUS_API_URL").unwrap_or(defaults.endpoint_url),
            session_id: get("OPENMANUS_SESSION_ID").unwrap_or(defaults.session_id),
            request_timeout,
            simulate,
            port,
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value = raw, "Ignoring malformed configuration value");
    }
    parsed
}
