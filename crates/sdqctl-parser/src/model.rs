//! The workflow document model: global directives + an ordered step
//! sequence. Immutable after parse (the executor never mutates a
//! `Workflow` or `Step`).

use sdqctl_core::{OnErrorPolicy, OutputCapturePolicy, OutputFormat, SessionMode, ValidationMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global directives: set once per workflow, last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDirectives {
    pub adapter: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub session_mode: SessionMode,
    pub max_cycles: Option<u32>,
    pub context_limit_percent: Option<u8>,
    pub on_context_limit: Option<String>,
    #[serde(default = "default_compaction_min")]
    pub compaction_min: u8,
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: u8,
    #[serde(default = "default_compaction_max")]
    pub compaction_max: u8,
    #[serde(default)]
    pub infinite_sessions: bool,
    pub session_name: Option<String>,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub allow_patterns: Vec<String>,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
    pub output_file: Option<String>,
    pub output_dir: Option<String>,
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub footers: Vec<String>,
    #[serde(default)]
    pub validation_mode: ValidationMode,
    pub checkpoint_dir: Option<PathBuf>,
    pub event_log: Option<PathBuf>,
    #[serde(default)]
    pub allow_shell: bool,
    /// Global prologues, applied per-cycle at the first turn.
    #[serde(default)]
    pub prologues: Vec<String>,
    /// Global epilogues, applied per-cycle at the last turn.
    #[serde(default)]
    pub epilogues: Vec<String>,
    /// `CONSULT-TIMEOUT` in seconds, bounding how stale a paused
    /// consultation may be before resume refuses it.
    pub consult_timeout_secs: Option<u64>,
}

fn default_compaction_min() -> u8 {
    30
}
fn default_compaction_threshold() -> u8 {
    80
}
fn default_compaction_max() -> u8 {
    95
}

impl Default for GlobalDirectives {
    fn default() -> Self {
        Self {
            adapter: None,
            model: None,
            session_mode: SessionMode::default(),
            max_cycles: None,
            context_limit_percent: None,
            on_context_limit: None,
            compaction_min: default_compaction_min(),
            compaction_threshold: default_compaction_threshold(),
            compaction_max: default_compaction_max(),
            infinite_sessions: false,
            session_name: None,
            cwd: None,
            allow_patterns: Vec::new(),
            deny_patterns: Vec::new(),
            output_format: OutputFormat::Json,
            output_file: None,
            output_dir: None,
            headers: Vec::new(),
            footers: Vec::new(),
            validation_mode: ValidationMode::default(),
            checkpoint_dir: None,
            event_log: None,
            allow_shell: false,
            prologues: Vec::new(),
            epilogues: Vec::new(),
            consult_timeout_secs: None,
        }
    }
}

/// A fully parsed workflow: global directives + ordered step sequence.
/// Immutable after parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub globals: GlobalDirectives,
    pub steps: Vec<Step>,
}

/// One step in the sequence, tagged with its kind-specific payload and
/// an optional elide-group id (only `Prompt`, `Run`'s captured output,
/// `Verify`'s captured output, and `Refcat` may share a group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub elide_group: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepKind {
    Prompt { body: String },
    Run(RunStep),
    Verify(VerifyStep),
    Compact(CompactStep),
    Checkpoint(CheckpointStep),
    Pause { message: String },
    Consult { topic: String },
    Refcat { refs: Vec<String> },
    Help { topics: Vec<String> },
    /// `CONTEXT <path>` — materialized at render time into the context block.
    Context { path: String, optional: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    pub command: String,
    #[serde(default)]
    pub env_additions: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub on_error: OnErrorPolicy,
    #[serde(default)]
    pub output_capture: OutputCapturePolicy,
    pub output_limit_bytes: Option<usize>,
    /// Whether the executor blocks the cycle on this command's exit
    /// (`RUN-WAIT false` / `RUN-ASYNC` fires it and moves on).
    #[serde(default = "default_run_wait")]
    pub wait: bool,
    pub retry_count: Option<u32>,
    pub retry_prompt: Option<String>,
    /// Flat, non-branching step list played when the command exits non-zero.
    #[serde(default)]
    pub on_failure: Vec<Step>,
    /// Flat, non-branching step list played when the command exits zero.
    #[serde(default)]
    pub on_success: Vec<Step>,
}

fn default_run_wait() -> bool {
    true
}

impl Default for RunStep {
    fn default() -> Self {
        Self {
            command: String::new(),
            env_additions: Vec::new(),
            cwd: None,
            timeout_secs: None,
            on_error: OnErrorPolicy::default(),
            output_capture: OutputCapturePolicy::default(),
            output_limit_bytes: None,
            wait: default_run_wait(),
            retry_count: None,
            retry_prompt: None,
            on_failure: Vec::new(),
            on_success: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerifyStep {
    pub name: String,
    #[serde(default)]
    pub options: Vec<(String, String)>,
    #[serde(default)]
    pub on_error: OnErrorPolicy,
    #[serde(default)]
    pub output_capture: OutputCapturePolicy,
    pub output_limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompactStep {
    #[serde(default)]
    pub preserve_tags: Vec<String>,
    pub summary_hint: Option<String>,
    pub prologue: Option<String>,
    pub epilogue: Option<String>,
    #[serde(default)]
    pub force_reset: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckpointStep {
    pub name: Option<String>,
    #[serde(default)]
    pub pause: bool,
    pub after_n_cycles: Option<u32>,
}

impl Step {
    pub fn simple(kind: StepKind) -> Self {
        Self {
            kind,
            elide_group: None,
        }
    }

    /// Whether this step kind is allowed to participate in an elide
    /// group: PROMPT, RUN (output), VERIFY (output), REFCAT only.
    pub fn is_elidable(&self) -> bool {
        matches!(
            self.kind,
            StepKind::Prompt { .. }
                | StepKind::Run(_)
                | StepKind::Verify(_)
                | StepKind::Refcat { .. }
        )
    }

    /// Whether this step kind may legally appear inside an
    /// `ON-FAILURE`/`ON-SUCCESS` block (no nested branching, no ELIDE).
    pub fn is_valid_block_element(&self) -> bool {
        !matches!(self.kind, StepKind::Run(_)) || {
            if let StepKind::Run(r) = &self.kind {
                r.on_failure.is_empty() && r.on_success.is_empty()
            } else {
                true
            }
        }
    }
}
