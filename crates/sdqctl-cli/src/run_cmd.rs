use crate::config::WorkflowRunConfig;
use crate::errors::{executor_error_to_engine, termination_summary, termination_to_engine_error};
use sdqctl_checkpoint::CheckpointStore;
use sdqctl_executor::{run_workflow, ExecutorConfig};
use sdqctl_parser::ParseOutcome;
use sdqctl_refs::build_alias_table;
use sdqctl_render::{render, RenderOptions};
use sdqctl_session::MockAgent;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[allow(clippy::too_many_arguments)]
pub async fn handle_run(
    workflow_path: PathBuf,
    adapter: String,
    dry_run: bool,
    max_cycles: Option<u32>,
    session_name: Option<String>,
    resume: bool,
    json_errors: bool,
    cd: Option<PathBuf>,
    vars: Vec<(String, String)>,
) -> i32 {
    let mut workflow = match sdqctl_parser::parse_file(&workflow_path) {
        ParseOutcome::Ok { workflow, warnings } => {
            for warning in &warnings {
                eprintln!("warning: {warning}");
            }
            workflow
        }
        ParseOutcome::Err(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("error: {diagnostic}");
            }
            return 2;
        }
    };

    if let Some(n) = max_cycles {
        workflow.globals.max_cycles = Some(n);
    }
    if let Some(name) = session_name {
        workflow.globals.session_name = Some(name);
    }

    let workspace_root = cd.unwrap_or_else(|| {
        workflow_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let run_config = match WorkflowRunConfig::resolve(workspace_root.clone(), &adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    let session_name = workflow
        .globals
        .session_name
        .clone()
        .unwrap_or_else(|| workflow.name.clone());
    let checkpoint_dir = workflow
        .globals
        .checkpoint_dir
        .clone()
        .unwrap_or_else(|| run_config.checkpoint_dir.clone());
    // `run_workflow` resumes automatically whenever it finds a checkpoint
    // under this session name; `--resume` here is a fail-fast guard in the
    // other direction, so a user expecting to resume gets a clear error
    // rather than a silent fresh start if no checkpoint is actually there.
    if resume {
        let store = CheckpointStore::new(checkpoint_dir.clone());
        if let Err(e) = store.load_for_resume(&session_name) {
            eprintln!("error: {e}");
            return 2;
        }
    }

    if dry_run {
        return dry_run_preview(&workflow, &workspace_root, vars);
    }

    let aliases = match build_alias_table(&workspace_root, &HashMap::new(), &HashMap::new()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };

    let agent: Arc<dyn sdqctl_session::Agent> = Arc::new(MockAgent::default());
    let config = ExecutorConfig {
        workspace_root: workspace_root.clone(),
        cwd: workspace_root.clone(),
        workflow_path: workflow_path.clone(),
        checkpoint_dir,
        aliases,
        vars: vars.into_iter().collect(),
        cli_prologues: Vec::new(),
        agent,
        stop_file_nonce: "sdqctl-run".to_string(),
        reset_on_compact: false,
    };

    match run_workflow(&workflow, &config).await {
        Ok(summary) => {
            if let Some(engine_err) = termination_to_engine_error(&summary.reason) {
                if json_errors {
                    eprintln!("{}", engine_err.to_json());
                } else {
                    eprintln!("{}", termination_summary(&summary.reason));
                }
            } else {
                eprintln!("{}", termination_summary(&summary.reason));
            }
            summary.reason.exit_code()
        }
        Err(err) => {
            let engine_err = executor_error_to_engine(&err);
            if json_errors {
                eprintln!("{}", engine_err.to_json());
            } else {
                eprintln!("error: {err}");
            }
            engine_err.exit_code() as i32
        }
    }
}

/// `--dry-run`: render the first cycle without creating a session or
/// executing any RUN/VERIFY side effects.
fn dry_run_preview(
    workflow: &sdqctl_parser::Workflow,
    workspace_root: &std::path::Path,
    vars: Vec<(String, String)>,
) -> i32 {
    let aliases = match build_alias_table(workspace_root, &HashMap::new(), &HashMap::new()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return 2;
        }
    };
    let step_outputs = HashMap::new();
    let render_opts = RenderOptions {
        cycle: 1,
        first_turn: true,
        last_turn: true,
        cli_prologues: &[],
        help_topics: &[],
        iteration: None,
        step_outputs: &step_outputs,
    };
    let template_vars = vars.into_iter().collect();
    match render(
        workflow,
        &template_vars,
        workspace_root,
        workspace_root,
        &aliases,
        &render_opts,
    ) {
        Ok(envelope) => {
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return 2;
                }
            }
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            2
        }
    }
}
