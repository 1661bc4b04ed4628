//! Pure rendering: given a parsed workflow, a cycle index, template
//! bindings, and a reference resolver, produce the fully-materialized
//! prompt sequence and a versioned JSON envelope.

pub mod context;
pub mod elide;
pub mod envelope;
pub mod error;
pub mod help;

pub use envelope::{ContextFileRendered, CycleEnvelope, ResolvedPrompt, SCHEMA_VERSION};
pub use error::RenderError;

use sdqctl_core::TemplateVars;
use sdqctl_parser::Workflow;
use sdqctl_refs::AliasTable;
use sdqctl_template::{substitute, SubstitutionContext};
use std::collections::HashMap;
use std::path::Path;

/// Options that vary per cycle but aren't part of the workflow document.
pub struct RenderOptions<'a> {
    pub cycle: u32,
    pub first_turn: bool,
    pub last_turn: bool,
    pub cli_prologues: &'a [String],
    pub help_topics: &'a [String],
    pub iteration: Option<(u32, u32)>,
    pub step_outputs: &'a HashMap<usize, String>,
}

/// Render one cycle of `workflow` into a `CycleEnvelope`. Pure given
/// fixed file contents: identical inputs produce byte-identical output.
pub fn render(
    workflow: &Workflow,
    vars: &TemplateVars,
    workspace_root: &Path,
    cwd: &Path,
    aliases: &AliasTable,
    options: &RenderOptions,
) -> Result<CycleEnvelope, RenderError> {
    let mut cycle_vars = vars.clone();
    cycle_vars.insert("CYCLE_NUMBER".to_string(), options.cycle.to_string());
    if let Some((index, total)) = options.iteration {
        cycle_vars.insert("ITERATION_INDEX".to_string(), index.to_string());
        cycle_vars.insert("ITERATION_TOTAL".to_string(), total.to_string());
    }

    let context = context::build_context_block(
        &workflow.steps,
        workspace_root,
        cwd,
        aliases,
        workflow.globals.validation_mode,
    )?;
    for warning in &context.warnings {
        tracing::warn!(%warning, "context rendering warning");
    }

    let turns = elide::collapse(&workflow.steps, options.step_outputs);

    let mut help_prologues = Vec::new();
    for topic in options.help_topics {
        help_prologues.push(help::expand_topic(topic)?.to_string());
    }

    let mut prompts = Vec::new();
    let last_index = turns.len().saturating_sub(1);
    for (i, turn) in turns.iter().enumerate() {
        let mut resolved = String::new();
        if i == 0 {
            for p in options.cli_prologues {
                resolved.push_str(p);
                resolved.push_str("\n\n");
            }
            for p in &help_prologues {
                resolved.push_str(p);
                resolved.push_str("\n\n");
            }
            for p in &workflow.globals.prologues {
                resolved.push_str(p);
                resolved.push_str("\n\n");
            }
        }
        resolved.push_str(&turn.raw);
        if i == last_index {
            for e in &workflow.globals.epilogues {
                resolved.push('\n');
                resolved.push('\n');
                resolved.push_str(e);
            }
        }

        let substituted = substitute(&resolved, &cycle_vars, SubstitutionContext::PromptBody);
        prompts.push(ResolvedPrompt {
            raw: turn.raw.clone(),
            resolved: substituted,
            elide_group: turn.elide_group,
        });
    }

    let context_files = context
        .files
        .into_iter()
        .map(|(path, content)| ContextFileRendered { path, content })
        .collect();

    Ok(CycleEnvelope {
        schema_version: SCHEMA_VERSION.to_string(),
        cycle: options.cycle,
        adapter: workflow.globals.adapter.clone(),
        model: workflow.globals.model.clone(),
        max_cycles: workflow.globals.max_cycles,
        template_variables: cycle_vars,
        prompts,
        context_files,
    })
}
