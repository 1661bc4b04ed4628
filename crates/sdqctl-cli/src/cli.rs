use clap::{Parser, Subcommand};
use sdqctl_core::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sdqctl", version, about = "Workflow execution engine for multi-cycle agent conversations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a workflow to completion (or until it pauses/consults/fails).
    Run {
        /// Path to the workflow file (.conv)
        workflow: PathBuf,

        /// Agent backend to drive turns with; only `mock` ships in this crate
        #[arg(long, default_value = "mock")]
        adapter: String,

        /// Parse and render each cycle without sending any turns
        #[arg(long)]
        dry_run: bool,

        /// Override the workflow's MAX-CYCLES directive
        #[arg(long)]
        max_cycles: Option<u32>,

        /// Session name used for the checkpoint directory and adapter session hint
        #[arg(long)]
        session_name: Option<String>,

        /// Resume from the last checkpoint for this session, if one exists
        #[arg(long)]
        resume: bool,

        /// Emit a JSON error body on stderr (and a non-zero exit) instead of a plain message
        #[arg(long)]
        json_errors: bool,

        /// Working directory the workflow is evaluated against (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,

        /// `KEY=VALUE` template variable override, may be repeated
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Render one cycle of a workflow to its JSON envelope without executing it
    Render {
        /// Path to the workflow file (.conv)
        workflow: PathBuf,

        /// Cycle number to render (1-based, matching CYCLE_NUMBER)
        #[arg(long, default_value_t = 1)]
        cycle: u32,

        /// Working directory the workflow is evaluated against (defaults to CWD)
        #[arg(long)]
        cd: Option<PathBuf>,

        /// `KEY=VALUE` template variable override, may be repeated
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Parse a workflow and report diagnostics without executing it
    Validate {
        /// Path to the workflow file (.conv)
        workflow: PathBuf,

        /// Collect warnings instead of treating the first diagnostic as fatal
        #[arg(long)]
        lenient: bool,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
