use sdqctl_core::TemplateVars;
use sdqctl_executor::turn_plan::{plan_units, Unit};
use sdqctl_parser::{ParseOutcome, StepKind};
use sdqctl_refs::build_alias_table;
use sdqctl_render::{render, RenderOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub async fn handle_render(
    workflow_path: PathBuf,
    cycle: u32,
    cwd: Option<PathBuf>,
    vars: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let outcome = sdqctl_parser::parse_file(&workflow_path);
    let workflow = match outcome {
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
            anyhow::bail!("parse failed with {} diagnostic(s)", diagnostics.len());
        }
    };

    let workspace_root = resolve_workspace_root(&workflow_path, cwd)?;
    let aliases = build_alias_table(&workspace_root, &HashMap::new(), &HashMap::new())?;
    let template_vars: TemplateVars = vars.into_iter().collect();

    let units = plan_units(&workflow.steps);
    let total_turn_groups = units.iter().filter(|u| matches!(u, Unit::TurnGroup(_))).count();
    let help_topics: Vec<String> = workflow
        .steps
        .iter()
        .filter_map(|step| match &step.kind {
            StepKind::Help { topics } => Some(topics.clone()),
            _ => None,
        })
        .flatten()
        .collect();

    let step_outputs: HashMap<usize, String> = HashMap::new();
    let render_opts = RenderOptions {
        cycle,
        first_turn: true,
        last_turn: total_turn_groups <= 1,
        cli_prologues: &[],
        help_topics: help_topics.as_slice(),
        iteration: None,
        step_outputs: &step_outputs,
    };
    let envelope = render(
        &workflow,
        &template_vars,
        &workspace_root,
        &workspace_root,
        &aliases,
        &render_opts,
    )?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn resolve_workspace_root(workflow_path: &Path, cwd: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(cwd) = cwd {
        return Ok(cwd);
    }
    let parent = workflow_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(parent)
}
