#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    #[error("failed to create checkpoint directory '{path}': {source}")]
    CreateDirFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write checkpoint '{path}': {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read checkpoint '{path}': {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse checkpoint '{path}': {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no checkpoint found for session '{0}'")]
    NotFound(String),

    #[error("session '{session}' is locked by another process (pid {pid})")]
    Locked { session: String, pid: u32 },

    #[error("consultation for session '{session}' expired at {expired_at}")]
    ConsultExpired {
        session: String,
        expired_at: chrono::DateTime<chrono::Utc>,
    },
}
