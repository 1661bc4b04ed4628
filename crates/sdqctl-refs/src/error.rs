use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RefError {
    #[error("alias '{alias}' is not registered in workspace.lock.json or the user-global alias table")]
    UnknownAlias { alias: String },

    #[error("reference path '{path}' escapes the workspace root")]
    PathEscapesRoot { path: PathBuf },

    #[error("reference file '{path}' does not exist")]
    FileNotFound { path: PathBuf },

    #[error("cannot read reference file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid line range in reference '{raw}': {reason}")]
    InvalidLineRange { raw: String, reason: String },

    #[error("cannot parse workspace.lock.json at '{path}': {source}")]
    LockParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
