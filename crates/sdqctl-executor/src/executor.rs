//! The per-cycle state machine: walks a workflow's steps in order,
//! executing RUN/VERIFY/REFCAT side effects and calling
//! `sdqctl_render::render` fresh at each turn boundary so the renderer
//! never needs to know which steps have actually executed yet.

use crate::branch::play_branch;
use crate::config::ExecutorConfig;
use crate::error::ExecutorError;
use crate::outcome::{ExecutionSummary, TerminationReason};
use crate::run_dispatch::{dispatch_run, is_fatal_run_failure};
use crate::turn_plan::{plan_units, Unit};
use crate::verify_dispatch::dispatch_verify;
use chrono::Utc;
use sdqctl_checkpoint::{Checkpoint, CheckpointStatus, CheckpointStore};
use sdqctl_compact::{CompactionController, CompactionEvent, CompactionMode, CompactionThresholds};
use sdqctl_core::{OutputCapturePolicy, SessionMode};
use sdqctl_parser::{StepKind, Workflow};
use sdqctl_render::{render, RenderOptions};
use sdqctl_session::{Agent, AgentEvent, LoopDetector, Session, SessionConfig, SessionStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Run `workflow` to completion (or until it pauses, consults, hits a
/// loop, rate limit, or a fatal RUN/VERIFY failure), per spec.md §4.5.
pub async fn run_workflow(
    workflow: &Workflow,
    config: &ExecutorConfig,
) -> Result<ExecutionSummary, ExecutorError> {
    let session_name = workflow
        .globals
        .session_name
        .clone()
        .unwrap_or_else(|| workflow.name.clone());
    let checkpoint_dir = workflow
        .globals
        .checkpoint_dir
        .clone()
        .unwrap_or_else(|| config.checkpoint_dir.clone());
    let store = CheckpointStore::new(checkpoint_dir.clone());
    let _lock = sdqctl_checkpoint::acquire_lock(&checkpoint_dir, &session_name)?;

    let resumed = store.load(&session_name)?;
    let mut vars = config.vars.clone();
    let mut cycle = 0u32;
    if let Some(checkpoint) = &resumed {
        cycle = checkpoint.cycle_index;
        for (k, v) in &checkpoint.template_variables {
            vars.insert(k.clone(), v.clone());
        }
    }

    let session_config = SessionConfig {
        model: workflow.globals.model.clone(),
        streaming: false,
        infinite_sessions: workflow.globals.infinite_sessions,
        background_compaction_threshold: Some(workflow.globals.compaction_threshold as u32),
        buffer_exhaustion_threshold: Some(workflow.globals.compaction_max as u32),
        session_name_hint: Some(session_name.clone()),
    };
    let mut session = match &resumed {
        Some(checkpoint) => {
            config
                .agent
                .resume_session(&checkpoint.session_name_or_id, &session_config)
                .await?
        }
        None => config.agent.create_session(&session_config).await?,
    };

    let backend_compaction_events: Arc<Mutex<Vec<CompactionEvent>>> = Arc::new(Mutex::new(Vec::new()));
    register_compaction_handler(config.agent.as_ref(), &session, backend_compaction_events.clone())?;

    let mut stats = SessionStats::new();
    let mut loop_detector = LoopDetector::new(config.stop_file_nonce.clone());
    let thresholds = CompactionThresholds {
        min: workflow.globals.compaction_min as u32,
        threshold: workflow.globals.compaction_threshold as u32,
        max: workflow.globals.compaction_max as u32,
    };
    let mode = if workflow.globals.infinite_sessions {
        CompactionMode::BackendNative
    } else {
        CompactionMode::ClientSideFallback {
            reset_on_compact: config.reset_on_compact,
        }
    };
    let mut compaction = CompactionController::new(thresholds, mode);

    let units = plan_units(&workflow.steps);
    let total_turn_groups = units
        .iter()
        .filter(|u| matches!(u, Unit::TurnGroup(_)))
        .count();
    let help_topics: Vec<String> = workflow
        .steps
        .iter()
        .filter_map(|step| match &step.kind {
            StepKind::Help { topics } => Some(topics.clone()),
            _ => None,
        })
        .flatten()
        .collect();

    loop {
        if let Some(max) = workflow.globals.max_cycles {
            if cycle >= max {
                return Ok(ExecutionSummary {
                    reason: TerminationReason::MaxCyclesReached,
                    cycles_completed: cycle,
                    checkpoint_written: false,
                });
            }
        }

        match workflow.globals.session_mode {
            SessionMode::Fresh => {
                let old = std::mem::replace(&mut session, Session { id: String::new() });
                config.agent.destroy_session(old).await?;
                session = config.agent.create_session(&session_config).await?;
                register_compaction_handler(config.agent.as_ref(), &session, backend_compaction_events.clone())?;
            }
            SessionMode::Compact => {
                maybe_compact(config, &session, &mut compaction, &mut stats).await?;
            }
            SessionMode::Accumulate => {}
        }

        let registry = sdqctl_verify::default_registry(
            workflow,
            &config.workspace_root,
            &config.cwd,
            &config.aliases,
        )?;

        let mut step_outputs: HashMap<usize, String> = HashMap::new();
        let mut turn_index = 0usize;

        for unit in &units {
            match unit {
                Unit::TurnGroup(indices) => {
                    for &idx in indices {
                        let step = &workflow.steps[idx];
                        match &step.kind {
                            StepKind::Prompt { .. } => {}
                            StepKind::Run(run_step) => {
                                let agent = config.agent.clone();
                                let session_ref = &session;
                                let outcome = dispatch_run(
                                    run_step,
                                    &config.workspace_root,
                                    workflow.globals.allow_shell,
                                    |prompt| {
                                        let agent = agent.clone();
                                        let session = session_ref.clone();
                                        async move {
                                            let _ = agent.send(&session, &prompt).await;
                                        }
                                    },
                                )
                                .await?;
                                if is_fatal_run_failure(run_step, &outcome.last_result) {
                                    let note = outcome.last_result.stderr.clone();
                                    return finish(
                                        &store,
                                        &session_name,
                                        &session,
                                        cycle,
                                        idx,
                                        CheckpointStatus::RunFailed,
                                        TerminationReason::RunFailed(note),
                                        &vars,
                                        config,
                                        workflow,
                                        &stats,
                                    );
                                }
                                let has_branch =
                                    !run_step.on_failure.is_empty() || !run_step.on_success.is_empty();
                                if has_branch {
                                    let branch = if outcome.last_result.success() {
                                        &run_step.on_success
                                    } else {
                                        &run_step.on_failure
                                    };
                                    if !branch.is_empty() {
                                        play_branch(
                                            branch,
                                            config.agent.as_ref(),
                                            &session,
                                            &vars,
                                            &registry,
                                            &config.workspace_root,
                                            &config.cwd,
                                            &config.aliases,
                                            workflow.globals.allow_shell,
                                        )
                                        .await?;
                                    }
                                }
                                let should_inject = match run_step.output_capture {
                                    OutputCapturePolicy::Always => true,
                                    OutputCapturePolicy::OnError => !outcome.last_result.success(),
                                    OutputCapturePolicy::Never => false,
                                };
                                if should_inject {
                                    step_outputs.insert(idx, outcome.last_result.stdout.clone());
                                }
                            }
                            StepKind::Verify(verify_step) => {
                                let outcome =
                                    dispatch_verify(&registry, verify_step, &config.workspace_root, &config.cwd)?;
                                if !outcome.result.passed
                                    && matches!(verify_step.on_error, sdqctl_core::OnErrorPolicy::Stop)
                                {
                                    return finish(
                                        &store,
                                        &session_name,
                                        &session,
                                        cycle,
                                        idx,
                                        CheckpointStatus::VerifyFailed,
                                        TerminationReason::VerifyFailed(outcome.result.summary.clone()),
                                        &vars,
                                        config,
                                        workflow,
                                        &stats,
                                    );
                                }
                                if let Some(markdown) = outcome.injected_markdown {
                                    step_outputs.insert(idx, markdown);
                                }
                            }
                            StepKind::Refcat { refs } => {
                                let excerpts = sdqctl_refs::resolve_refcat_tokens(
                                    refs,
                                    &config.workspace_root,
                                    &config.cwd,
                                    &config.aliases,
                                )?;
                                let joined = excerpts
                                    .iter()
                                    .map(|e| format!("{}\n\n{}", e.attribution(), e.content))
                                    .collect::<Vec<_>>()
                                    .join("\n\n");
                                step_outputs.insert(idx, joined);
                            }
                            _ => unreachable!("non-elidable step kind in a TurnGroup"),
                        }
                    }

                    let render_opts = RenderOptions {
                        cycle: cycle + 1,
                        first_turn: turn_index == 0,
                        last_turn: turn_index + 1 == total_turn_groups,
                        cli_prologues: config.cli_prologues.as_slice(),
                        help_topics: help_topics.as_slice(),
                        iteration: None,
                        step_outputs: &step_outputs,
                    };
                    let envelope = render(
                        workflow,
                        &vars,
                        &config.workspace_root,
                        &config.cwd,
                        &config.aliases,
                        &render_opts,
                    )?;
                    let prompt_text = envelope.prompts[turn_index].resolved.clone();

                    let response = match config.agent.send(&session, &prompt_text).await {
                        Ok(response) => response,
                        Err(sdqctl_session::SessionError::RateLimited(message)) => {
                            let detected = sdqctl_session::detect_rate_limit(&message, Some("rate_limit"), None)
                                .unwrap_or(sdqctl_session::RateLimitDetected { matched_on: message });
                            return finish(
                                &store,
                                &session_name,
                                &session,
                                cycle,
                                idx_of(indices),
                                CheckpointStatus::RateLimited,
                                TerminationReason::RateLimited(detected),
                                &vars,
                                config,
                                workflow,
                                &stats,
                            );
                        }
                        Err(other) => return Err(other.into()),
                    };

                    stats.record_turn(response.tokens_used, response.max_tokens, Utc::now());
                    drain_backend_compaction_events(&backend_compaction_events, &mut compaction, &mut stats);

                    if let Some(detected) = loop_detector.observe(
                        &response.text,
                        response.reasoning.as_deref(),
                        response.tool_calls_made,
                        &config.workspace_root,
                        cycle + 1,
                        idx_of(indices),
                    ) {
                        let is_stop_file = matches!(
                            detected.reason,
                            sdqctl_session::LoopReason::StopFile(_)
                        );
                        return finish(
                            &store,
                            &session_name,
                            &session,
                            cycle,
                            idx_of(indices),
                            CheckpointStatus::LoopDetected,
                            if is_stop_file {
                                TerminationReason::StopFile
                            } else {
                                TerminationReason::LoopDetected(detected)
                            },
                            &vars,
                            config,
                            workflow,
                            &stats,
                        );
                    }

                    turn_index += 1;
                }
                Unit::SideEffect(idx) => {
                    let step = &workflow.steps[*idx];
                    match &step.kind {
                        StepKind::Pause { message } => {
                            return finish(
                                &store,
                                &session_name,
                                &session,
                                cycle,
                                *idx,
                                CheckpointStatus::Paused,
                                TerminationReason::Paused {
                                    message: message.clone(),
                                },
                                &vars,
                                config,
                                workflow,
                                &stats,
                            );
                        }
                        StepKind::Consult { topic } => {
                            let checkpoint = Checkpoint {
                                schema_version: sdqctl_checkpoint::CHECKPOINT_SCHEMA_VERSION,
                                session_name_or_id: session.id.clone(),
                                workflow_path: config.workflow_path.display().to_string(),
                                session_mode: workflow.globals.session_mode,
                                status: CheckpointStatus::Consult,
                                cycle_index: cycle,
                                step_index: *idx,
                                created_at: Utc::now(),
                                consult_expires_at: workflow
                                    .globals
                                    .consult_timeout_secs
                                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs as i64)),
                                template_variables: vars.clone(),
                                stats_snapshot: stats.clone(),
                                masked_env: sdqctl_core::types::mask_env(&std::env::vars().collect()),
                                adapter_config: None,
                                note: Some(topic.clone()),
                            };
                            store.save(&checkpoint)?;
                            return Ok(ExecutionSummary {
                                reason: TerminationReason::Consulting {
                                    topic: topic.clone(),
                                },
                                cycles_completed: cycle,
                                checkpoint_written: true,
                            });
                        }
                        StepKind::Checkpoint(cp) => {
                            if cp.pause {
                                return finish(
                                    &store,
                                    &session_name,
                                    &session,
                                    cycle,
                                    *idx,
                                    CheckpointStatus::Paused,
                                    TerminationReason::Paused {
                                        message: cp
                                            .name
                                            .clone()
                                            .unwrap_or_else(|| "checkpoint".to_string()),
                                    },
                                    &vars,
                                    config,
                                    workflow,
                                    &stats,
                                );
                            }
                            // Named, non-pausing checkpoints are recorded as a
                            // side-channel marker only; execution continues.
                            tracing::info!(name = ?cp.name, "checkpoint marker reached");
                        }
                        StepKind::Compact(compact_step) => {
                            run_explicit_compaction(
                                config,
                                &session,
                                &mut compaction,
                                &mut stats,
                                compact_step.force_reset,
                            )
                            .await?;
                        }
                        StepKind::Context { .. } => {}
                        _ => {}
                    }
                }
            }
        }

        cycle += 1;
    }
}

fn idx_of(indices: &[usize]) -> usize {
    indices.last().copied().unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
fn finish(
    store: &CheckpointStore,
    session_name: &str,
    session: &Session,
    cycle: u32,
    step_index: usize,
    status: CheckpointStatus,
    reason: TerminationReason,
    vars: &sdqctl_core::TemplateVars,
    config: &ExecutorConfig,
    workflow: &Workflow,
    stats: &SessionStats,
) -> Result<ExecutionSummary, ExecutorError> {
    let checkpoint = Checkpoint {
        schema_version: sdqctl_checkpoint::CHECKPOINT_SCHEMA_VERSION,
        session_name_or_id: if session.id.is_empty() {
            session_name.to_string()
        } else {
            session.id.clone()
        },
        workflow_path: config.workflow_path.display().to_string(),
        session_mode: workflow.globals.session_mode,
        status,
        cycle_index: cycle,
        step_index,
        created_at: Utc::now(),
        consult_expires_at: None,
        template_variables: vars.clone(),
        stats_snapshot: stats.clone(),
        masked_env: sdqctl_core::types::mask_env(&std::env::vars().collect()),
        adapter_config: None,
        note: None,
    };
    store.save(&checkpoint)?;
    Ok(ExecutionSummary {
        reason,
        cycles_completed: cycle,
        checkpoint_written: true,
    })
}

/// Register the session's one permitted event handler (per spec.md
/// §4.8's register-once invariant) to catch `CompactionComplete` events
/// off the backend-native compaction path. Client-side fallback never
/// emits these; the handler is a no-op in that mode beyond accumulating
/// nothing.
fn register_compaction_handler(
    agent: &dyn Agent,
    session: &Session,
    events: Arc<Mutex<Vec<CompactionEvent>>>,
) -> Result<(), sdqctl_session::SessionError> {
    agent.on(
        session,
        Box::new(move |event: &AgentEvent| {
            if let AgentEvent::CompactionComplete {
                tokens_before,
                tokens_after,
                summary_content,
            } = event
            {
                events.lock().unwrap().push(CompactionEvent {
                    tokens_before: *tokens_before,
                    tokens_after: *tokens_after,
                    summary_content: summary_content.clone(),
                });
            }
        }),
    )
}

/// Drain any `CompactionComplete` events the registered handler caught
/// since the last turn, recording each into the controller's event list
/// and syncing stats' token counts, per spec.md §4.7's backend-native
/// path: observe the events, record pre/post tokens, otherwise do
/// nothing.
fn drain_backend_compaction_events(
    events: &Arc<Mutex<Vec<CompactionEvent>>>,
    compaction: &mut CompactionController,
    stats: &mut SessionStats,
) {
    let mut guard = events.lock().unwrap();
    let pending: Vec<CompactionEvent> = std::mem::take(&mut *guard);
    drop(guard);
    for event in pending {
        stats.record_turn(event.tokens_after, stats.max_tokens, Utc::now());
        compaction.record_event(event);
    }
}

async fn maybe_compact(
    config: &ExecutorConfig,
    session: &Session,
    compaction: &mut CompactionController,
    stats: &mut SessionStats,
) -> Result<(), ExecutorError> {
    let (used, max) = config.agent.get_context_usage(session).await?;
    let used_pct = if max == 0 { 0 } else { (used * 100 / max) as u32 };
    run_compaction_for_pct(config, session, compaction, stats, used_pct, false).await
}

async fn run_explicit_compaction(
    config: &ExecutorConfig,
    session: &Session,
    compaction: &mut CompactionController,
    stats: &mut SessionStats,
    force_reset: bool,
) -> Result<(), ExecutorError> {
    let (used, max) = config.agent.get_context_usage(session).await?;
    let used_pct = if max == 0 { 0 } else { (used * 100 / max) as u32 };
    run_compaction_for_pct(config, session, compaction, stats, used_pct, force_reset).await
}

async fn run_compaction_for_pct(
    config: &ExecutorConfig,
    session: &Session,
    compaction: &mut CompactionController,
    stats: &mut SessionStats,
    used_pct: u32,
    force_reset: bool,
) -> Result<(), ExecutorError> {
    let action = compaction.fallback_action(used_pct);
    if matches!(action, sdqctl_compact::FallbackAction::Skip) && !force_reset {
        return Ok(());
    }
    let (tokens_before, max_tokens) = config.agent.get_context_usage(session).await?;
    let summary_prompt = "Summarize the conversation so far in a form that preserves the \
         essential state for continuing this work.";
    let response = config.agent.send(session, summary_prompt).await?;
    let tokens_after = response.tokens_used;
    compaction.record_event(sdqctl_compact::CompactionEvent {
        tokens_before,
        tokens_after,
        summary_content: response.text.clone(),
    });
    stats.record_turn(tokens_after, max_tokens, Utc::now());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdqctl_parser::{GlobalDirectives, RunStep};
    use sdqctl_refs::AliasTable;
    use sdqctl_session::{MockAgent, ScriptedTurn};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn config(dir: &tempfile::TempDir, agent: Arc<dyn sdqctl_session::Agent>) -> ExecutorConfig {
        ExecutorConfig {
            workspace_root: dir.path().to_path_buf(),
            cwd: dir.path().to_path_buf(),
            workflow_path: dir.path().join("w.conv"),
            checkpoint_dir: dir.path().join("checkpoints"),
            aliases: AliasTable::default(),
            vars: BTreeMap::new(),
            cli_prologues: Vec::new(),
            agent,
            stop_file_nonce: "test-nonce".to_string(),
            reset_on_compact: false,
        }
    }

    fn workflow(name: &str, globals: GlobalDirectives, steps: Vec<sdqctl_parser::Step>) -> Workflow {
        Workflow {
            name: name.to_string(),
            globals,
            steps,
        }
    }

    #[tokio::test]
    async fn test_max_cycles_reached_terminates_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockAgent::new(vec![ScriptedTurn::new("ok", 1, 100)]));
        let globals = GlobalDirectives {
            max_cycles: Some(2),
            ..Default::default()
        };
        let wf = workflow(
            "w",
            globals,
            vec![sdqctl_parser::Step::simple(StepKind::Prompt {
                body: "do the thing".to_string(),
            })],
        );
        let cfg = config(&dir, agent);
        let summary = run_workflow(&wf, &cfg).await.unwrap();
        assert!(matches!(summary.reason, TerminationReason::MaxCyclesReached));
        assert_eq!(summary.cycles_completed, 2);
        assert!(!summary.checkpoint_written);
    }

    #[tokio::test]
    async fn test_pause_step_writes_checkpoint_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockAgent::new(vec![ScriptedTurn::new("ok", 1, 100)]));
        let wf = workflow(
            "w",
            GlobalDirectives::default(),
            vec![
                sdqctl_parser::Step::simple(StepKind::Prompt {
                    body: "hello".to_string(),
                }),
                sdqctl_parser::Step::simple(StepKind::Pause {
                    message: "waiting on human".to_string(),
                }),
            ],
        );
        let cfg = config(&dir, agent);
        let summary = run_workflow(&wf, &cfg).await.unwrap();
        match summary.reason {
            TerminationReason::Paused { message } => assert_eq!(message, "waiting on human"),
            other => panic!("expected Paused, got {other:?}"),
        }
        assert!(summary.checkpoint_written);
        let store = CheckpointStore::new(cfg.checkpoint_dir.clone());
        // MockAgent hands out deterministic ids starting at "mock-1" for
        // the first session created in a fresh instance.
        let checkpoint = store.load("mock-1").unwrap().expect("checkpoint should exist");
        assert_eq!(checkpoint.status, CheckpointStatus::Paused);
    }

    #[tokio::test]
    async fn test_run_failure_with_stop_policy_terminates_as_run_failed() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockAgent::new(vec![ScriptedTurn::new("ok", 1, 100)]));
        let run_step = RunStep {
            command: "false".to_string(),
            on_error: sdqctl_core::OnErrorPolicy::Stop,
            ..Default::default()
        };
        let wf = workflow(
            "w",
            GlobalDirectives {
                allow_shell: true,
                ..Default::default()
            },
            vec![sdqctl_parser::Step::simple(StepKind::Run(run_step))],
        );
        let cfg = config(&dir, agent);
        let summary = run_workflow(&wf, &cfg).await.unwrap();
        assert!(matches!(summary.reason, TerminationReason::RunFailed(_)));
        assert!(summary.checkpoint_written);
    }

    #[tokio::test]
    async fn test_run_failure_with_branch_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockAgent::new(vec![ScriptedTurn::new("ok", 1, 100)]));
        let run_step = RunStep {
            command: "false".to_string(),
            on_error: sdqctl_core::OnErrorPolicy::Stop,
            on_failure: vec![sdqctl_parser::Step::simple(StepKind::Prompt {
                body: "handle the failure".to_string(),
            })],
            ..Default::default()
        };
        let wf = workflow(
            "w",
            GlobalDirectives {
                allow_shell: true,
                max_cycles: Some(1),
                ..Default::default()
            },
            vec![sdqctl_parser::Step::simple(StepKind::Run(run_step))],
        );
        let cfg = config(&dir, agent);
        let summary = run_workflow(&wf, &cfg).await.unwrap();
        assert!(matches!(summary.reason, TerminationReason::MaxCyclesReached));
    }

    #[tokio::test]
    async fn test_non_pausing_checkpoint_marker_does_not_stop_execution() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Arc::new(MockAgent::new(vec![ScriptedTurn::new("ok", 1, 100)]));
        let wf = workflow(
            "w",
            GlobalDirectives {
                max_cycles: Some(1),
                ..Default::default()
            },
            vec![
                sdqctl_parser::Step::simple(StepKind::Checkpoint(sdqctl_parser::CheckpointStep {
                    name: Some("mid-cycle".to_string()),
                    pause: false,
                    after_n_cycles: None,
                })),
                sdqctl_parser::Step::simple(StepKind::Prompt {
                    body: "hello".to_string(),
                }),
            ],
        );
        let cfg = config(&dir, agent);
        let summary = run_workflow(&wf, &cfg).await.unwrap();
        assert!(matches!(summary.reason, TerminationReason::MaxCyclesReached));
        assert_eq!(summary.cycles_completed, 1);
    }
}
