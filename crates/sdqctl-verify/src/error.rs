use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("no verifier registered under the name '{0}'")]
    UnknownVerifier(String),

    #[error("cannot read verifier manifest '{path}': {source}")]
    ManifestReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse verifier manifest '{path}': {source}")]
    ManifestParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("external verifier '{name}' timed out after {timeout_secs}s")]
    PluginTimedOut { name: String, timeout_secs: u64 },

    #[error("external verifier '{name}' failed to launch: {source}")]
    PluginLaunchFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
