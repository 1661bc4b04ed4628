#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("RUN requires ALLOW-SHELL enabled; refusing to execute '{command}'")]
    ShellNotAllowed { command: String },

    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },

    #[error("I/O error while capturing output of '{command}': {source}")]
    CaptureFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
