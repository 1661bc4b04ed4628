use sdqctl_core::TemplateVars;
use sdqctl_refs::AliasTable;
use sdqctl_session::Agent;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the executor needs that isn't part of the parsed
/// `Workflow` itself.
pub struct ExecutorConfig {
    pub workspace_root: PathBuf,
    pub cwd: PathBuf,
    /// Source path of the workflow being run, recorded into any
    /// checkpoint written this run.
    pub workflow_path: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub aliases: AliasTable,
    pub vars: TemplateVars,
    pub cli_prologues: Vec<String>,
    pub agent: Arc<dyn Agent>,
    pub stop_file_nonce: String,
    /// `--reset-on-compact`: client-side compaction fallback destroys
    /// and recreates the session, reinjecting the summary.
    pub reset_on_compact: bool,
}
