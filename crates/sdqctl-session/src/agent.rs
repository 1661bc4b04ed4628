use crate::error::SessionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Config passed to `create_session`/`resume_session`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub streaming: bool,
    pub infinite_sessions: bool,
    pub background_compaction_threshold: Option<u32>,
    pub buffer_exhaustion_threshold: Option<u32>,
    pub session_name_hint: Option<String>,
}

/// Opaque handle the adapter hands back; the executor never inspects
/// the inside, only passes it back into `send`/`get_context_usage`/etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

/// Metadata about a backend-tracked session, from `list_sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub modified_time: chrono::DateTime<chrono::Utc>,
    pub summary: Option<String>,
    pub is_remote: bool,
}

/// Full result of one `send`: final text plus token counts synced from
/// the backend's usage channel.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub text: String,
    pub tokens_used: u64,
    pub max_tokens: u64,
    pub reasoning: Option<String>,
    pub tool_calls_made: u32,
}

/// Events the executor consumes off a session's stream, per spec.md
/// §4.8. Field names mirror the JSON shapes an adapter would parse off
/// the wire, kept flat here since this crate ships only `MockAgent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AgentEvent {
    SessionStart,
    SessionIdle,
    SessionError { message: String },
    SessionTruncation,
    AssistantTurnStart,
    AssistantTurnEnd,
    AssistantMessage { delta: String },
    AssistantReasoning { text: String },
    AssistantUsage {
        tokens_used: u64,
        max_tokens: u64,
        quota: Option<QuotaSnapshot>,
    },
    ToolExecutionStart { tool_call_id: String, tool_name: String },
    ToolExecutionComplete { tool_call_id: String },
    CompactionStart,
    CompactionComplete { tokens_before: u64, tokens_after: u64, summary_content: String },
    Abort,
    Handoff,
    ModelChange { model: String },
}

/// Quota snapshot fields parsed from the backend, per spec.md §4.8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub remaining_percentage: Option<f64>,
    pub reset_date: Option<chrono::DateTime<chrono::Utc>>,
    pub used_requests: Option<u64>,
    pub entitlement_requests: Option<u64>,
    pub is_unlimited_entitlement: bool,
}

pub type EventHandler = Box<dyn Fn(&AgentEvent) + Send + Sync>;

/// Look up a tool's name from an event payload shaped like a raw JSON
/// object, trying the documented field fallback chain.
pub fn resolve_tool_name(payload: &serde_json::Value) -> String {
    for field in ["tool_name", "name", "tool"] {
        if let Some(s) = payload.get(field).and_then(|v| v.as_str()) {
            return s.to_string();
        }
    }
    if let Some(name) = payload
        .get("tool_requests")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|first| first.get("name"))
        .and_then(|v| v.as_str())
    {
        return name.to_string();
    }
    "unknown".to_string()
}

/// Uniform operations the executor requires from any backend, per
/// spec.md §4.8. This crate ships exactly one implementation,
/// [`crate::mock::MockAgent`]; concrete backend bindings are out of
/// scope.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn create_session(&self, config: &SessionConfig) -> Result<Session, SessionError>;
    async fn resume_session(
        &self,
        id: &str,
        config: &SessionConfig,
    ) -> Result<Session, SessionError>;
    async fn destroy_session(&self, session: Session) -> Result<(), SessionError>;
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError>;
    async fn delete_session(&self, id: &str) -> Result<(), SessionError>;
    async fn send(&self, session: &Session, text: &str) -> Result<Response, SessionError>;
    async fn get_context_usage(&self, session: &Session) -> Result<(u64, u64), SessionError>;

    /// Register an event handler for `session`. Must be called exactly
    /// once per session lifetime; a second call is the canonical bug
    /// source the spec calls out, so implementations return
    /// [`SessionError::HandlerAlreadyRegistered`] rather than silently
    /// overwriting the prior handler.
    fn on(&self, session: &Session, handler: EventHandler) -> Result<(), SessionError>;
}
