//! The directive parser's state machine: walks logical lines, tracks a
//! block-context stack (elide chain / ON-FAILURE / ON-SUCCESS), and
//! builds a `Workflow`.

use crate::diagnostics::{ParseDiagnostic, ParseOutcome};
use crate::lexer::{is_directive_shaped, tokenize, LogicalLine};
use crate::model::{
    CheckpointStep, CompactStep, GlobalDirectives, RunStep, Step, StepKind, VerifyStep, Workflow,
};
use sdqctl_core::{OnErrorPolicy, OutputCapturePolicy, OutputFormat, SessionMode, ValidationMode};
use std::path::{Path, PathBuf};

/// Directives accepted but not implemented by the executor; the parser
/// warns once and drops their value rather than treating them as
/// unknown (open question #3 in DESIGN.md).
const KNOWN_UNIMPLEMENTED: &[&str] = &["VERIFY-COVERAGE", "VERIFY-TRACE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    OnFailure,
    OnSuccess,
}

struct BranchFrame {
    kind: BranchKind,
    buffer: Vec<Step>,
    /// Index into `top_steps` of the RUN step this branch attaches to.
    run_index: usize,
}

pub struct Parser {
    globals: GlobalDirectives,
    top_steps: Vec<Step>,
    diagnostics: Vec<ParseDiagnostic>,
    warnings: Vec<ParseDiagnostic>,
    lenient: bool,
    elide_active: Option<u32>,
    next_elide_group: u32,
    branch_stack: Vec<BranchFrame>,
    /// Index (in `top_steps`, or within the active branch buffer) of the
    /// most recently opened RUN/VERIFY/COMPACT/CHECKPOINT step, for
    /// modifier directives (`RUN-ENV`, `VERIFY-OPTION`, ...).
    current_run: Option<usize>,
    current_verify: Option<usize>,
    current_compact: Option<usize>,
    current_checkpoint: Option<usize>,
}

pub fn parse_str(name: &str, file: &Path, text: &str) -> ParseOutcome {
    let raw: Vec<(PathBuf, u32, String)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (file.to_path_buf(), (i + 1) as u32, l.to_string()))
        .collect();
    parse_lines(name, raw)
}

pub fn parse_file(file: &Path) -> ParseOutcome {
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "workflow".to_string());
    match crate::include::flatten(file) {
        Ok(lines) => parse_lines(&name, lines),
        Err(diag) => ParseOutcome::Err(vec![diag]),
    }
}

fn parse_lines(name: &str, raw: Vec<(PathBuf, u32, String)>) -> ParseOutcome {
    let logical = tokenize(&raw);
    let mut parser = Parser {
        globals: GlobalDirectives::default(),
        top_steps: Vec::new(),
        diagnostics: Vec::new(),
        warnings: Vec::new(),
        lenient: false,
        elide_active: None,
        next_elide_group: 0,
        branch_stack: Vec::new(),
        current_run: None,
        current_verify: None,
        current_compact: None,
        current_checkpoint: None,
    };

    for line in &logical {
        if parser.process_line(line) {
            break; // strict-mode abort
        }
    }

    if parser.branch_stack.is_empty() {
        // ok
    } else {
        let frame = parser.branch_stack.last().unwrap();
        let kw = match frame.kind {
            BranchKind::OnFailure => "ON-FAILURE",
            BranchKind::OnSuccess => "ON-SUCCESS",
        };
        parser.report(ParseDiagnostic::new(
            logical
                .last()
                .map(|l| l.file.clone())
                .unwrap_or_else(|| PathBuf::from(name)),
            logical.last().map(|l| l.line_no).unwrap_or(0),
            format!("unterminated {kw} block: missing END"),
        ));
    }

    if !parser.diagnostics.is_empty() {
        return ParseOutcome::Err(parser.diagnostics);
    }

    ParseOutcome::Ok {
        workflow: Workflow {
            name: name.to_string(),
            globals: parser.globals,
            steps: parser.top_steps,
        },
        warnings: parser.warnings,
    }
}

impl Parser {
    /// Push a diagnostic. Returns `true` if the caller should stop
    /// processing further lines (strict mode: first error aborts).
    fn report(&mut self, diag: ParseDiagnostic) -> bool {
        let abort = !self.lenient;
        self.diagnostics.push(diag);
        abort
    }

    fn warn(&mut self, diag: ParseDiagnostic) {
        self.warnings.push(diag);
    }

    /// Append `step` either to the active branch buffer or to the
    /// top-level step list, applying the current elide-chain state.
    fn push_step(&mut self, line: &LogicalLine, mut step: Step) -> bool {
        if let Some(group) = self.elide_active {
            if matches!(step.kind, StepKind::Compact(_)) {
                return self.report(ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    "COMPACT is not allowed inside an ELIDE chain",
                ));
            }
            if step.is_elidable() {
                step.elide_group = Some(group);
            } else {
                self.elide_active = None;
            }
        }

        if let Some(frame) = self.branch_stack.last_mut() {
            if !step.is_valid_block_element() {
                return self.report(ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    "ON-FAILURE/ON-SUCCESS blocks may not contain branching RUN steps",
                ));
            }
            let idx = frame.buffer.len();
            frame.buffer.push(step);
            self.set_current_index(&line.keyword, idx, true);
        } else {
            let idx = self.top_steps.len();
            self.top_steps.push(step);
            self.set_current_index(&line.keyword, idx, false);
        }
        false
    }

    fn set_current_index(&mut self, opener_keyword: &str, idx: usize, in_branch: bool) {
        // Modifier directives always target the most recent step of the
        // matching kind, regardless of whether it lives in a branch
        // buffer or at the top level; we track only the index, and
        // resolve through the right container when applying modifiers.
        let _ = in_branch;
        match opener_keyword {
            "RUN" => self.current_run = Some(idx),
            "VERIFY" => self.current_verify = Some(idx),
            "COMPACT" => self.current_compact = Some(idx),
            "CHECKPOINT" => self.current_checkpoint = Some(idx),
            _ => {}
        }
    }

    /// Mutable access to the step currently targeted by RUN/VERIFY/
    /// COMPACT/CHECKPOINT modifier directives.
    fn current_container(&mut self) -> &mut Vec<Step> {
        if let Some(frame) = self.branch_stack.last_mut() {
            &mut frame.buffer
        } else {
            &mut self.top_steps
        }
    }

    /// Process one logical line. Returns `true` if parsing should stop.
    fn process_line(&mut self, line: &LogicalLine) -> bool {
        if !is_directive_shaped(&line.keyword) {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("'{}' is not a valid directive keyword", line.keyword),
            ));
        }

        if KNOWN_UNIMPLEMENTED.contains(&line.keyword.as_str()) {
            self.warn(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} is recognized but not implemented by the executor", line.keyword),
            ));
            return false;
        }

        match line.keyword.as_str() {
            "INCLUDE" => false, // already spliced by flatten()

            // ---- global directives ----
            "ADAPTER" => {
                self.globals.adapter = Some(line.value.clone());
                false
            }
            "MODEL" => {
                self.globals.model = Some(line.value.clone());
                false
            }
            "SESSION-MODE" => match line.value.as_str() {
                "accumulate" => {
                    self.globals.session_mode = SessionMode::Accumulate;
                    false
                }
                "compact" => {
                    self.globals.session_mode = SessionMode::Compact;
                    false
                }
                "fresh" => {
                    self.globals.session_mode = SessionMode::Fresh;
                    false
                }
                other => self.report(
                    ParseDiagnostic::new(
                        &line.file,
                        line.line_no,
                        format!("invalid SESSION-MODE '{other}'"),
                    )
                    .with_hint("use accumulate, compact, or fresh"),
                ),
            },
            "MAX-CYCLES" => self.set_u32_positive(line, |g, v| g.max_cycles = Some(v)),
            "CONTEXT-LIMIT-PERCENT" => {
                self.set_percent(line, |g, v| g.context_limit_percent = Some(v))
            }
            "ON-CONTEXT-LIMIT" => {
                self.globals.on_context_limit = Some(line.value.clone());
                false
            }
            "COMPACTION-MIN" => self.set_percent(line, |g, v| g.compaction_min = v),
            "COMPACTION-THRESHOLD" => self.set_percent(line, |g, v| g.compaction_threshold = v),
            "COMPACTION-MAX" => self.set_percent(line, |g, v| g.compaction_max = v),
            "INFINITE-SESSIONS" => self.set_bool(line, |g, v| g.infinite_sessions = v),
            "SESSION-NAME" => {
                self.globals.session_name = Some(line.value.clone());
                false
            }
            "CWD" => {
                self.globals.cwd = Some(PathBuf::from(&line.value));
                false
            }
            "ALLOW-PATTERN" => {
                self.globals.allow_patterns.push(line.value.clone());
                false
            }
            "DENY-PATTERN" => {
                self.globals.deny_patterns.push(line.value.clone());
                false
            }
            "OUTPUT-FORMAT" => match line.value.as_str() {
                "json" => {
                    self.globals.output_format = OutputFormat::Json;
                    false
                }
                "text" => {
                    self.globals.output_format = OutputFormat::Text;
                    false
                }
                other => self.report(ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    format!("invalid OUTPUT-FORMAT '{other}'"),
                )),
            },
            "OUTPUT-FILE" => {
                self.globals.output_file = Some(line.value.clone());
                false
            }
            "OUTPUT-DIR" => {
                self.globals.output_dir = Some(line.value.clone());
                false
            }
            "HEADER" => {
                self.globals.headers.push(line.value.clone());
                false
            }
            "FOOTER" => {
                self.globals.footers.push(line.value.clone());
                false
            }
            "PROLOGUE" => {
                self.globals.prologues.push(line.value.clone());
                false
            }
            "EPILOGUE" => {
                self.globals.epilogues.push(line.value.clone());
                false
            }
            "VALIDATION-MODE" => match line.value.as_str() {
                "strict" => {
                    self.globals.validation_mode = ValidationMode::Strict;
                    self.lenient = false;
                    false
                }
                "lenient" => {
                    self.globals.validation_mode = ValidationMode::Lenient;
                    self.lenient = true;
                    false
                }
                other => self.report(ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    format!("invalid VALIDATION-MODE '{other}'"),
                )),
            },
            "CHECKPOINT-DIR" => {
                self.globals.checkpoint_dir = Some(PathBuf::from(&line.value));
                false
            }
            "EVENT-LOG" => {
                self.globals.event_log = Some(PathBuf::from(&line.value));
                false
            }
            "ALLOW-SHELL" => self.set_bool(line, |g, v| g.allow_shell = v),
            "CONSULT-TIMEOUT" => self.set_u64_positive(line, |g, v| g.consult_timeout_secs = Some(v)),

            // ---- step openers ----
            "PROMPT" => self.push_step(line, Step::simple(StepKind::Prompt { body: line.value.clone() })),
            "RUN" => self.push_step(
                line,
                Step::simple(StepKind::Run(RunStep {
                    command: line.value.clone(),
                    ..Default::default()
                })),
            ),
            "VERIFY" => self.push_step(
                line,
                Step::simple(StepKind::Verify(VerifyStep {
                    name: line.value.clone(),
                    ..Default::default()
                })),
            ),
            "COMPACT" => self.push_step(line, Step::simple(StepKind::Compact(CompactStep::default()))),
            "CHECKPOINT" => {
                let name = if line.value.is_empty() {
                    None
                } else {
                    Some(line.value.clone())
                };
                self.push_step(
                    line,
                    Step::simple(StepKind::Checkpoint(CheckpointStep {
                        name,
                        ..Default::default()
                    })),
                )
            }
            "PAUSE" => self.push_step(line, Step::simple(StepKind::Pause { message: line.value.clone() })),
            "CONSULT" => self.push_step(line, Step::simple(StepKind::Consult { topic: line.value.clone() })),
            "REFCAT" => self.push_step(
                line,
                Step::simple(StepKind::Refcat {
                    refs: split_refs(&line.value),
                }),
            ),
            "HELP" => self.push_step(
                line,
                Step::simple(StepKind::Help {
                    topics: line.value.split_whitespace().map(String::from).collect(),
                }),
            ),
            "CONTEXT" => self.push_step(
                line,
                Step::simple(StepKind::Context {
                    path: line.value.clone(),
                    optional: false,
                }),
            ),
            "CONTEXT-OPTIONAL" => self.push_step(
                line,
                Step::simple(StepKind::Context {
                    path: line.value.clone(),
                    optional: true,
                }),
            ),
            "ELIDE" => {
                if !self.branch_stack.is_empty() {
                    return self.report(ParseDiagnostic::new(
                        &line.file,
                        line.line_no,
                        "ELIDE is not allowed inside an ON-FAILURE/ON-SUCCESS block",
                    ));
                }
                self.elide_active = Some(self.next_elide_group);
                self.next_elide_group += 1;
                false
            }

            // ---- RUN modifiers ----
            "RUN-ENV" => self.modify_run(line, |r, v| {
                if let Some((k, val)) = v.split_once('=') {
                    r.env_additions.push((k.trim().to_string(), val.trim().to_string()));
                    None
                } else {
                    Some("RUN-ENV expects KEY=VALUE".to_string())
                }
            }),
            "RUN-CWD" => self.modify_run(line, |r, v| {
                r.cwd = Some(PathBuf::from(v));
                None
            }),
            "RUN-TIMEOUT" => self.modify_run(line, |r, v| match v.parse::<u64>() {
                Ok(n) if n > 0 => {
                    r.timeout_secs = Some(n);
                    None
                }
                _ => Some(format!("RUN-TIMEOUT expects a positive integer, got '{v}'")),
            }),
            "RUN-ON-ERROR" => self.modify_run(line, |r, v| match v {
                "stop" => {
                    r.on_error = OnErrorPolicy::Stop;
                    None
                }
                "continue" => {
                    r.on_error = OnErrorPolicy::Continue;
                    None
                }
                other => Some(format!("invalid RUN-ON-ERROR '{other}'")),
            }),
            "RUN-OUTPUT" => self.modify_run(line, |r, v| match v {
                "on-error" => {
                    r.output_capture = OutputCapturePolicy::OnError;
                    None
                }
                "always" => {
                    r.output_capture = OutputCapturePolicy::Always;
                    None
                }
                "never" => {
                    r.output_capture = OutputCapturePolicy::Never;
                    None
                }
                other => Some(format!("invalid RUN-OUTPUT '{other}'")),
            }),
            "RUN-OUTPUT-LIMIT" => self.modify_run(line, |r, v| match v.parse::<usize>() {
                Ok(n) if n > 0 => {
                    r.output_limit_bytes = Some(n);
                    None
                }
                _ => Some(format!("RUN-OUTPUT-LIMIT expects a positive integer, got '{v}'")),
            }),
            "RUN-WAIT" => self.modify_run(line, |r, v| {
                r.wait = v != "false" && v != "no";
                None
            }),
            "RUN-RETRY" => self.modify_run(line, |r, v| {
                let mut parts = v.splitn(2, char::is_whitespace);
                let count = parts.next().unwrap_or("").parse::<u32>().ok();
                let prompt = parts
                    .next()
                    .map(|s| s.trim().trim_matches('"').to_string());
                match count {
                    Some(n) => {
                        r.retry_count = Some(n);
                        r.retry_prompt = prompt;
                        None
                    }
                    None => Some(format!("RUN-RETRY expects 'N \"prompt\"', got '{v}'")),
                }
            }),

            // ---- VERIFY modifiers ----
            "VERIFY-OPTION" => self.modify_verify(line, |verify, v| {
                if let Some((k, val)) = v.split_once('=') {
                    verify.options.push((k.trim().to_string(), val.trim().to_string()));
                    None
                } else {
                    Some("VERIFY-OPTION expects KEY=VALUE".to_string())
                }
            }),
            "VERIFY-ON-ERROR" => self.modify_verify(line, |verify, v| match v {
                "fail" | "stop" => {
                    verify.on_error = OnErrorPolicy::Stop;
                    None
                }
                "continue" | "warn" => {
                    verify.on_error = OnErrorPolicy::Warn;
                    None
                }
                other => Some(format!("invalid VERIFY-ON-ERROR '{other}'")),
            }),
            "VERIFY-OUTPUT" => self.modify_verify(line, |verify, v| match v {
                "on-error" => {
                    verify.output_capture = OutputCapturePolicy::OnError;
                    None
                }
                "always" => {
                    verify.output_capture = OutputCapturePolicy::Always;
                    None
                }
                "never" => {
                    verify.output_capture = OutputCapturePolicy::Never;
                    None
                }
                other => Some(format!("invalid VERIFY-OUTPUT '{other}'")),
            }),
            "VERIFY-OUTPUT-LIMIT" => self.modify_verify(line, |verify, v| match v.parse::<usize>() {
                Ok(n) if n > 0 => {
                    verify.output_limit_bytes = Some(n);
                    None
                }
                _ => Some(format!("VERIFY-OUTPUT-LIMIT expects a positive integer, got '{v}'")),
            }),

            // ---- COMPACT modifiers ----
            "COMPACT-PRESERVE" => self.modify_compact(line, |c, v| {
                c.preserve_tags.push(v.to_string());
                None
            }),
            "COMPACT-SUMMARY-HINT" => self.modify_compact(line, |c, v| {
                c.summary_hint = Some(v.to_string());
                None
            }),
            "COMPACT-PROLOGUE" => self.modify_compact(line, |c, v| {
                c.prologue = Some(v.to_string());
                None
            }),
            "COMPACT-EPILOGUE" => self.modify_compact(line, |c, v| {
                c.epilogue = Some(v.to_string());
                None
            }),
            "COMPACT-RESET" => self.modify_compact(line, |c, v| {
                c.force_reset = v != "false" && v != "no";
                None
            }),

            // ---- CHECKPOINT modifiers ----
            "CHECKPOINT-PAUSE" => self.modify_checkpoint(line, |c, _v| {
                c.pause = true;
                None
            }),
            "CHECKPOINT-AFTER-N-CYCLES" => {
                self.modify_checkpoint(line, |c, v| match v.parse::<u32>() {
                    Ok(n) if n > 0 => {
                        c.after_n_cycles = Some(n);
                        None
                    }
                    _ => Some(format!(
                        "CHECKPOINT-AFTER-N-CYCLES expects a positive integer, got '{v}'"
                    )),
                })
            }

            // ---- block control ----
            "ON-FAILURE" | "ON-SUCCESS" => self.open_branch(line),
            "END" => self.close_branch(line),

            other => self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("unknown directive '{other}'"),
            )),
        }
    }

    fn open_branch(&mut self, line: &LogicalLine) -> bool {
        if !self.branch_stack.is_empty() {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                "nested ON-FAILURE/ON-SUCCESS blocks are not allowed",
            ));
        }
        if self.elide_active.is_some() {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                "a branch block is not allowed inside an ELIDE chain",
            ));
        }
        let run_index = match self.top_steps.last() {
            Some(step) if matches!(step.kind, StepKind::Run(_)) => self.top_steps.len() - 1,
            _ => {
                return self.report(ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    format!("{} must immediately follow a RUN step", line.keyword),
                ));
            }
        };
        let kind = if line.keyword == "ON-FAILURE" {
            BranchKind::OnFailure
        } else {
            BranchKind::OnSuccess
        };
        self.branch_stack.push(BranchFrame {
            kind,
            buffer: Vec::new(),
            run_index,
        });
        false
    }

    fn close_branch(&mut self, line: &LogicalLine) -> bool {
        let Some(frame) = self.branch_stack.pop() else {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                "END without a matching ON-FAILURE/ON-SUCCESS",
            ));
        };
        if let StepKind::Run(r) = &mut self.top_steps[frame.run_index].kind {
            match frame.kind {
                BranchKind::OnFailure => r.on_failure = frame.buffer,
                BranchKind::OnSuccess => r.on_success = frame.buffer,
            }
        }
        false
    }

    fn modify_run(
        &mut self,
        line: &LogicalLine,
        f: impl FnOnce(&mut RunStep, &str) -> Option<String>,
    ) -> bool {
        let Some(idx) = self.current_run else {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} with no preceding RUN step", line.keyword),
            ));
        };
        let value = line.value.clone();
        let err = {
            let container = self.current_container();
            match &mut container[idx].kind {
                StepKind::Run(r) => f(r, &value),
                _ => Some("internal error: current_run index is not a RUN step".to_string()),
            }
        };
        match err {
            Some(msg) => self.report(ParseDiagnostic::new(&line.file, line.line_no, msg)),
            None => false,
        }
    }

    fn modify_verify(
        &mut self,
        line: &LogicalLine,
        f: impl FnOnce(&mut VerifyStep, &str) -> Option<String>,
    ) -> bool {
        let Some(idx) = self.current_verify else {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} with no preceding VERIFY step", line.keyword),
            ));
        };
        let value = line.value.clone();
        let err = {
            let container = self.current_container();
            match &mut container[idx].kind {
                StepKind::Verify(v) => f(v, &value),
                _ => Some("internal error: current_verify index is not a VERIFY step".to_string()),
            }
        };
        match err {
            Some(msg) => self.report(ParseDiagnostic::new(&line.file, line.line_no, msg)),
            None => false,
        }
    }

    fn modify_compact(
        &mut self,
        line: &LogicalLine,
        f: impl FnOnce(&mut CompactStep, &str) -> Option<String>,
    ) -> bool {
        let Some(idx) = self.current_compact else {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} with no preceding COMPACT step", line.keyword),
            ));
        };
        let value = line.value.clone();
        let err = {
            let container = self.current_container();
            match &mut container[idx].kind {
                StepKind::Compact(c) => f(c, &value),
                _ => Some("internal error: current_compact index is not a COMPACT step".to_string()),
            }
        };
        match err {
            Some(msg) => self.report(ParseDiagnostic::new(&line.file, line.line_no, msg)),
            None => false,
        }
    }

    fn modify_checkpoint(
        &mut self,
        line: &LogicalLine,
        f: impl FnOnce(&mut CheckpointStep, &str) -> Option<String>,
    ) -> bool {
        let Some(idx) = self.current_checkpoint else {
            return self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} with no preceding CHECKPOINT step", line.keyword),
            ));
        };
        let value = line.value.clone();
        let err = {
            let container = self.current_container();
            match &mut container[idx].kind {
                StepKind::Checkpoint(c) => f(c, &value),
                _ => {
                    Some("internal error: current_checkpoint index is not a CHECKPOINT step".to_string())
                }
            }
        };
        match err {
            Some(msg) => self.report(ParseDiagnostic::new(&line.file, line.line_no, msg)),
            None => false,
        }
    }

    fn set_percent(&mut self, line: &LogicalLine, set: impl FnOnce(&mut GlobalDirectives, u8)) -> bool {
        match line.value.parse::<u8>() {
            Ok(n) if n <= 100 => {
                set(&mut self.globals, n);
                false
            }
            _ => self.report(
                ParseDiagnostic::new(
                    &line.file,
                    line.line_no,
                    format!("{} expects an integer 0-100, got '{}'", line.keyword, line.value),
                )
                .with_hint("use a percentage between 0 and 100"),
            ),
        }
    }

    fn set_u32_positive(
        &mut self,
        line: &LogicalLine,
        set: impl FnOnce(&mut GlobalDirectives, u32),
    ) -> bool {
        match line.value.parse::<u32>() {
            Ok(n) if n > 0 => {
                set(&mut self.globals, n);
                false
            }
            _ => self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} expects a positive integer, got '{}'", line.keyword, line.value),
            )),
        }
    }

    fn set_u64_positive(
        &mut self,
        line: &LogicalLine,
        set: impl FnOnce(&mut GlobalDirectives, u64),
    ) -> bool {
        match line.value.parse::<u64>() {
            Ok(n) if n > 0 => {
                set(&mut self.globals, n);
                false
            }
            _ => self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} expects a positive integer, got '{}'", line.keyword, line.value),
            )),
        }
    }

    fn set_bool(&mut self, line: &LogicalLine, set: impl FnOnce(&mut GlobalDirectives, bool)) -> bool {
        match line.value.as_str() {
            "enabled" | "true" | "yes" => {
                set(&mut self.globals, true);
                false
            }
            "disabled" | "false" | "no" => {
                set(&mut self.globals, false);
                false
            }
            other => self.report(ParseDiagnostic::new(
                &line.file,
                line.line_no,
                format!("{} expects enabled/disabled, got '{}'", line.keyword, other),
            )),
        }
    }
}

fn split_refs(value: &str) -> Vec<String> {
    value.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
