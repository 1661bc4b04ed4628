//! Canonical printer: renders a `Workflow` back to directive-line text.
//!
//! Re-parsing printed output must reproduce an equal `Workflow` (modulo
//! comments and whitespace, which the printer never emits). This is
//! exercised by the round-trip tests below rather than asserted at
//! runtime.

use crate::model::{GlobalDirectives, RunStep, Step, StepKind, VerifyStep, Workflow};
use sdqctl_core::{OnErrorPolicy, OutputCapturePolicy, OutputFormat, SessionMode, ValidationMode};
use std::fmt::Write as _;

pub fn print_workflow(wf: &Workflow) -> String {
    let mut out = String::new();
    print_globals(&wf.globals, &mut out);
    let mut active_group: Option<u32> = None;
    for step in &wf.steps {
        if step.elide_group != active_group {
            if let Some(g) = step.elide_group {
                writeln!(out, "ELIDE").unwrap();
                active_group = Some(g);
            } else {
                active_group = None;
            }
        }
        print_step(step, &mut out, 0);
    }
    out
}

fn print_globals(g: &GlobalDirectives, out: &mut String) {
    if let Some(a) = &g.adapter {
        writeln!(out, "ADAPTER {a}").unwrap();
    }
    if let Some(m) = &g.model {
        writeln!(out, "MODEL {m}").unwrap();
    }
    match g.session_mode {
        SessionMode::Accumulate => {}
        SessionMode::Compact => writeln!(out, "SESSION-MODE compact").unwrap(),
        SessionMode::Fresh => writeln!(out, "SESSION-MODE fresh").unwrap(),
    }
    if let Some(n) = g.max_cycles {
        writeln!(out, "MAX-CYCLES {n}").unwrap();
    }
    if let Some(p) = g.context_limit_percent {
        writeln!(out, "CONTEXT-LIMIT-PERCENT {p}").unwrap();
    }
    if let Some(v) = &g.on_context_limit {
        writeln!(out, "ON-CONTEXT-LIMIT {v}").unwrap();
    }
    if g.compaction_min != 30 {
        writeln!(out, "COMPACTION-MIN {}", g.compaction_min).unwrap();
    }
    if g.compaction_threshold != 80 {
        writeln!(out, "COMPACTION-THRESHOLD {}", g.compaction_threshold).unwrap();
    }
    if g.compaction_max != 95 {
        writeln!(out, "COMPACTION-MAX {}", g.compaction_max).unwrap();
    }
    if g.infinite_sessions {
        writeln!(out, "INFINITE-SESSIONS enabled").unwrap();
    }
    if let Some(n) = &g.session_name {
        writeln!(out, "SESSION-NAME {n}").unwrap();
    }
    if let Some(c) = &g.cwd {
        writeln!(out, "CWD {}", c.display()).unwrap();
    }
    for p in &g.allow_patterns {
        writeln!(out, "ALLOW-PATTERN {p}").unwrap();
    }
    for p in &g.deny_patterns {
        writeln!(out, "DENY-PATTERN {p}").unwrap();
    }
    match g.output_format {
        OutputFormat::Json => {}
        OutputFormat::Text => writeln!(out, "OUTPUT-FORMAT text").unwrap(),
    }
    if let Some(f) = &g.output_file {
        writeln!(out, "OUTPUT-FILE {f}").unwrap();
    }
    if let Some(d) = &g.output_dir {
        writeln!(out, "OUTPUT-DIR {d}").unwrap();
    }
    for h in &g.headers {
        writeln!(out, "HEADER {h}").unwrap();
    }
    for f in &g.footers {
        writeln!(out, "FOOTER {f}").unwrap();
    }
    for p in &g.prologues {
        writeln!(out, "PROLOGUE {p}").unwrap();
    }
    for e in &g.epilogues {
        writeln!(out, "EPILOGUE {e}").unwrap();
    }
    match g.validation_mode {
        ValidationMode::Strict => {}
        ValidationMode::Lenient => writeln!(out, "VALIDATION-MODE lenient").unwrap(),
    }
    if let Some(d) = &g.checkpoint_dir {
        writeln!(out, "CHECKPOINT-DIR {}", d.display()).unwrap();
    }
    if let Some(e) = &g.event_log {
        writeln!(out, "EVENT-LOG {}", e.display()).unwrap();
    }
    if g.allow_shell {
        writeln!(out, "ALLOW-SHELL enabled").unwrap();
    }
    if let Some(t) = g.consult_timeout_secs {
        writeln!(out, "CONSULT-TIMEOUT {t}").unwrap();
    }
}

fn print_step(step: &Step, out: &mut String, depth: usize) {
    match &step.kind {
        StepKind::Prompt { body } => print_multiline(out, "PROMPT", body),
        StepKind::Run(r) => print_run(r, out, depth),
        StepKind::Verify(v) => print_verify(v, out),
        StepKind::Compact(c) => {
            writeln!(out, "COMPACT").unwrap();
            for tag in &c.preserve_tags {
                writeln!(out, "COMPACT-PRESERVE {tag}").unwrap();
            }
            if let Some(h) = &c.summary_hint {
                writeln!(out, "COMPACT-SUMMARY-HINT {h}").unwrap();
            }
            if let Some(p) = &c.prologue {
                writeln!(out, "COMPACT-PROLOGUE {p}").unwrap();
            }
            if let Some(e) = &c.epilogue {
                writeln!(out, "COMPACT-EPILOGUE {e}").unwrap();
            }
            if c.force_reset {
                writeln!(out, "COMPACT-RESET enabled").unwrap();
            }
        }
        StepKind::Checkpoint(c) => {
            match &c.name {
                Some(n) => writeln!(out, "CHECKPOINT {n}").unwrap(),
                None => writeln!(out, "CHECKPOINT").unwrap(),
            }
            if c.pause {
                writeln!(out, "CHECKPOINT-PAUSE enabled").unwrap();
            }
            if let Some(n) = c.after_n_cycles {
                writeln!(out, "CHECKPOINT-AFTER-N-CYCLES {n}").unwrap();
            }
        }
        StepKind::Pause { message } => writeln!(out, "PAUSE {message}").unwrap(),
        StepKind::Consult { topic } => writeln!(out, "CONSULT {topic}").unwrap(),
        StepKind::Refcat { refs } => writeln!(out, "REFCAT {}", refs.join(" ")).unwrap(),
        StepKind::Help { topics } => writeln!(out, "HELP {}", topics.join(" ")).unwrap(),
        StepKind::Context { path, optional } => {
            let kw = if *optional { "CONTEXT-OPTIONAL" } else { "CONTEXT" };
            writeln!(out, "{kw} {path}").unwrap();
        }
    }
}

fn print_multiline(out: &mut String, keyword: &str, value: &str) {
    let mut lines = value.lines();
    match lines.next() {
        Some(first) => writeln!(out, "{keyword} {first}").unwrap(),
        None => writeln!(out, "{keyword}").unwrap(),
    }
    for line in lines {
        writeln!(out, "  {line}").unwrap();
    }
}

fn print_run(r: &RunStep, out: &mut String, depth: usize) {
    print_multiline(out, "RUN", &r.command);
    for (k, v) in &r.env_additions {
        writeln!(out, "RUN-ENV {k}={v}").unwrap();
    }
    if let Some(c) = &r.cwd {
        writeln!(out, "RUN-CWD {}", c.display()).unwrap();
    }
    if let Some(t) = r.timeout_secs {
        writeln!(out, "RUN-TIMEOUT {t}").unwrap();
    }
    match r.on_error {
        OnErrorPolicy::Stop => {}
        OnErrorPolicy::Continue => writeln!(out, "RUN-ON-ERROR continue").unwrap(),
        OnErrorPolicy::Warn => writeln!(out, "RUN-ON-ERROR warn").unwrap(),
    }
    match r.output_capture {
        OutputCapturePolicy::Always => {}
        OutputCapturePolicy::OnError => writeln!(out, "RUN-OUTPUT on-error").unwrap(),
        OutputCapturePolicy::Never => writeln!(out, "RUN-OUTPUT never").unwrap(),
    }
    if let Some(limit) = r.output_limit_bytes {
        writeln!(out, "RUN-OUTPUT-LIMIT {limit}").unwrap();
    }
    if !r.wait {
        writeln!(out, "RUN-WAIT false").unwrap();
    }
    if let Some(count) = r.retry_count {
        match &r.retry_prompt {
            Some(p) => writeln!(out, "RUN-RETRY {count} \"{p}\"").unwrap(),
            None => writeln!(out, "RUN-RETRY {count}").unwrap(),
        }
    }
    if !r.on_failure.is_empty() {
        writeln!(out, "ON-FAILURE").unwrap();
        for s in &r.on_failure {
            print_step(s, out, depth + 1);
        }
        writeln!(out, "END").unwrap();
    }
    if !r.on_success.is_empty() {
        writeln!(out, "ON-SUCCESS").unwrap();
        for s in &r.on_success {
            print_step(s, out, depth + 1);
        }
        writeln!(out, "END").unwrap();
    }
}

fn print_verify(v: &VerifyStep, out: &mut String) {
    writeln!(out, "VERIFY {}", v.name).unwrap();
    for (k, val) in &v.options {
        writeln!(out, "VERIFY-OPTION {k}={val}").unwrap();
    }
    match v.on_error {
        OnErrorPolicy::Stop => {}
        OnErrorPolicy::Continue => writeln!(out, "VERIFY-ON-ERROR continue").unwrap(),
        OnErrorPolicy::Warn => writeln!(out, "VERIFY-ON-ERROR warn").unwrap(),
    }
    match v.output_capture {
        OutputCapturePolicy::Always => {}
        OutputCapturePolicy::OnError => writeln!(out, "VERIFY-OUTPUT on-error").unwrap(),
        OutputCapturePolicy::Never => writeln!(out, "VERIFY-OUTPUT never").unwrap(),
    }
    if let Some(limit) = v.output_limit_bytes {
        writeln!(out, "VERIFY-OUTPUT-LIMIT {limit}").unwrap();
    }
}
