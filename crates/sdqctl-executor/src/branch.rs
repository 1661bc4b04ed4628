//! `ON-FAILURE`/`ON-SUCCESS` branch playback.
//!
//! Branches are dynamic, error-path content that doesn't exist in the
//! workflow's pre-known turn layout, so they bypass
//! `sdqctl_render::render` entirely: each branch step is substituted
//! and sent to the agent directly, in order. `is_valid_block_element`
//! already forbids nested branching and ELIDE inside a branch, so this
//! never recurses into another `on_failure`/`on_success`.

use crate::error::ExecutorError;
use crate::verify_dispatch::dispatch_verify;
use sdqctl_core::TemplateVars;
use sdqctl_parser::{Step, StepKind};
use sdqctl_refs::AliasTable;
use sdqctl_session::{Agent, Response, Session};
use sdqctl_template::{substitute, SubstitutionContext};
use sdqctl_verify::VerifierRegistry;
use std::path::Path;

/// Play `steps` as direct turns against `session`, returning the
/// responses collected along the way. Branch turns are not fed into
/// the caller's loop detector or token stats; they're error-recovery
/// content, not part of the cycle's main turn sequence.
#[allow(clippy::too_many_arguments)]
pub async fn play_branch(
    steps: &[Step],
    agent: &dyn Agent,
    session: &Session,
    vars: &TemplateVars,
    registry: &VerifierRegistry<'_>,
    workspace_root: &Path,
    cwd: &Path,
    aliases: &AliasTable,
    allow_shell: bool,
) -> Result<Vec<Response>, ExecutorError> {
    let mut responses = Vec::new();
    for step in steps {
        let text = match &step.kind {
            StepKind::Prompt { body } => Some(body.clone()),
            StepKind::Run(run_step) => {
                let outcome = crate::run_dispatch::dispatch_run(
                    run_step,
                    workspace_root,
                    allow_shell,
                    |_prompt| async {},
                )
                .await?;
                Some(format!(
                    "```\n{}\n```",
                    outcome.last_result.stdout.trim()
                ))
            }
            StepKind::Verify(verify_step) => {
                let outcome = dispatch_verify(registry, verify_step, workspace_root, cwd)?;
                outcome.injected_markdown
            }
            StepKind::Refcat { refs } => {
                let excerpts = sdqctl_refs::resolve_refcat_tokens(refs, workspace_root, cwd, aliases)?;
                let joined = excerpts
                    .iter()
                    .map(|e| format!("{}\n\n{}", e.attribution(), e.content))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                Some(joined)
            }
            _ => {
                tracing::warn!(kind = ?step.kind, "step kind not valid inside a branch, skipping");
                None
            }
        };
        if let Some(body) = text {
            let substituted = substitute(&body, vars, SubstitutionContext::PromptBody);
            let response = agent.send(session, &substituted).await?;
            responses.push(response);
        }
    }
    Ok(responses)
}
