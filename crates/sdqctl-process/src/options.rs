use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// Everything needed to run one `RUN` step's command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub command: String,
    pub env_additions: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
    /// Gate from the global `ALLOW-SHELL` directive; RUN refuses outright
    /// when this is false.
    pub allow_shell: bool,
}

impl RunOptions {
    pub fn new(command: impl Into<String>, allow_shell: bool) -> Self {
        Self {
            command: command.into(),
            env_additions: HashMap::new(),
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            allow_shell,
        }
    }

    pub fn with_env(mut self, env_additions: HashMap<String, String>) -> Self {
        self.env_additions = env_additions;
        self
    }

    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit_bytes = limit;
        self
    }
}
