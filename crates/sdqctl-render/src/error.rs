use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("required context file '{path}' does not exist")]
    MissingContextFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reference resolution failed: {0}")]
    RefError(#[from] sdqctl_refs::RefError),

    #[error("unknown HELP topic '{0}'")]
    UnknownHelpTopic(String),
}
