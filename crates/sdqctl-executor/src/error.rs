#[derive(thiserror::Error, Debug)]
pub enum ExecutorError {
    #[error("RUN step failed: {0}")]
    RunFailed(String),

    #[error(transparent)]
    Process(#[from] sdqctl_process::ProcessError),

    #[error(transparent)]
    Verify(#[from] sdqctl_verify::VerifyError),

    #[error(transparent)]
    Refs(#[from] sdqctl_refs::RefError),

    #[error(transparent)]
    Render(#[from] sdqctl_render::RenderError),

    #[error(transparent)]
    Session(#[from] sdqctl_session::SessionError),

    #[error(transparent)]
    Checkpoint(#[from] sdqctl_checkpoint::CheckpointError),

    #[error("VERIFY '{name}' failed: {summary}")]
    VerifyFailed { name: String, summary: String },
}
