#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("transport error talking to agent backend: {0}")]
    Transport(String),

    #[error("agent backend protocol error: {0}")]
    Protocol(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("no session registered with id '{0}'")]
    UnknownSession(String),

    #[error("handler already registered for session '{0}' (register-once invariant violated)")]
    HandlerAlreadyRegistered(String),
}

impl SessionError {
    /// Transient transport/protocol errors get one retry per spec.md §4.5's
    /// failure semantics; everything else is fatal immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transport(_) | SessionError::Protocol(_))
    }
}
