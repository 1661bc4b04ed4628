use crate::agent::{Agent, EventHandler, Response, Session, SessionConfig, SessionSummary};
use crate::error::SessionError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Script entry describing how `MockAgent` should answer the Nth `send`.
#[derive(Debug, Clone)]
pub struct ScriptedTurn {
    pub text: String,
    pub tokens_used: u64,
    pub max_tokens: u64,
}

impl ScriptedTurn {
    pub fn new(text: impl Into<String>, tokens_used: u64, max_tokens: u64) -> Self {
        Self {
            text: text.into(),
            tokens_used,
            max_tokens,
        }
    }
}

struct MockSessionState {
    sent_count: usize,
    handler_registered: bool,
}

/// The one adapter this crate ships, used by tests and by
/// `--adapter mock`. Responses are pulled in order from a fixed script;
/// once exhausted, the last scripted turn repeats.
pub struct MockAgent {
    script: Vec<ScriptedTurn>,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<String, MockSessionState>>,
}

impl MockAgent {
    pub fn new(script: Vec<ScriptedTurn>) -> Self {
        Self {
            script,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new(vec![ScriptedTurn::new("ok", 10, 100_000)])
    }
}

#[async_trait]
impl Agent for MockAgent {
    async fn create_session(&self, _config: &SessionConfig) -> Result<Session, SessionError> {
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sessions.lock().unwrap().insert(
            id.clone(),
            MockSessionState {
                sent_count: 0,
                handler_registered: false,
            },
        );
        Ok(Session { id })
    }

    async fn resume_session(
        &self,
        id: &str,
        _config: &SessionConfig,
    ) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.entry(id.to_string()).or_insert(MockSessionState {
            sent_count: 0,
            handler_registered: false,
        });
        Ok(Session { id: id.to_string() })
    }

    async fn destroy_session(&self, session: Session) -> Result<(), SessionError> {
        self.sessions.lock().unwrap().remove(&session.id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        Ok(Vec::new())
    }

    async fn delete_session(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }

    async fn send(&self, session: &Session, _text: &str) -> Result<Response, SessionError> {
        let mut sessions = self.sessions.lock().unwrap();
        let state = sessions
            .get_mut(&session.id)
            .ok_or_else(|| SessionError::UnknownSession(session.id.clone()))?;

        let index = state.sent_count.min(self.script.len().saturating_sub(1));
        let turn = self
            .script
            .get(index)
            .cloned()
            .ok_or_else(|| SessionError::Protocol("empty mock script".to_string()))?;
        state.sent_count += 1;

        Ok(Response {
            text: turn.text,
            tokens_used: turn.tokens_used,
            max_tokens: turn.max_tokens,
            reasoning: None,
            tool_calls_made: 0,
        })
    }

    async fn get_context_usage(&self, session: &Session) -> Result<(u64, u64), SessionError> {
        let sessions = self.sessions.lock().unwrap();
        let state = sessions
            .get(&session.id)
            .ok_or_else(|| SessionError::UnknownSession(session.id.clone()))?;
        let index = state.sent_count.saturating_sub(1).min(self.script.len().saturating_sub(1));
        let turn = self.script.get(index);
        Ok(turn.map(|t| (t.tokens_used, t.max_tokens)).unwrap_or((0, 0)))
    }

    fn on(&self, session: &Session, handler: EventHandler) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().unwrap();
        let state = sessions
            .get_mut(&session.id)
            .ok_or_else(|| SessionError::UnknownSession(session.id.clone()))?;
        if state.handler_registered {
            return Err(SessionError::HandlerAlreadyRegistered(session.id.clone()));
        }
        state.handler_registered = true;
        drop(handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            model: "mock-model".to_string(),
            streaming: false,
            infinite_sessions: false,
            background_compaction_threshold: None,
            buffer_exhaustion_threshold: None,
            session_name_hint: None,
        }
    }

    #[tokio::test]
    async fn test_send_returns_scripted_response() {
        let agent = MockAgent::new(vec![ScriptedTurn::new("hello there", 5, 1000)]);
        let session = agent.create_session(&config()).await.unwrap();
        let response = agent.send(&session, "hi").await.unwrap();
        assert_eq!(response.text, "hello there");
        assert_eq!(response.tokens_used, 5);
    }

    #[tokio::test]
    async fn test_script_exhaustion_repeats_last_turn() {
        let agent = MockAgent::new(vec![
            ScriptedTurn::new("first", 1, 100),
            ScriptedTurn::new("second", 2, 100),
        ]);
        let session = agent.create_session(&config()).await.unwrap();
        agent.send(&session, "a").await.unwrap();
        agent.send(&session, "b").await.unwrap();
        let third = agent.send(&session, "c").await.unwrap();
        assert_eq!(third.text, "second");
    }

    #[tokio::test]
    async fn test_double_handler_registration_errors() {
        let agent = MockAgent::default();
        let session = agent.create_session(&config()).await.unwrap();
        agent.on(&session, Box::new(|_| {})).unwrap();
        let err = agent.on(&session, Box::new(|_| {})).unwrap_err();
        assert!(matches!(err, SessionError::HandlerAlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn test_send_on_unknown_session_errors() {
        let agent = MockAgent::default();
        let err = agent
            .send(&Session { id: "ghost".to_string() }, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownSession(_)));
    }
}
