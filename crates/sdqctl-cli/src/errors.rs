//! Maps `sdqctl-executor`'s outcomes onto `sdqctl-core::EngineError` at
//! the CLI boundary: process exit code plus, with `--json-errors`, a
//! structured body instead of a one-line message.

use sdqctl_core::EngineError;
use sdqctl_executor::{ExecutorError, TerminationReason};

/// Hard failures (the `Err` path out of `run_workflow`) map directly
/// onto the shared error taxonomy.
pub fn executor_error_to_engine(err: &ExecutorError) -> EngineError {
    match err {
        ExecutorError::RunFailed(message) => EngineError::RunCommandFailed {
            command: String::new(),
            exit_code: -1,
            stderr_tail: message.clone(),
        },
        ExecutorError::Process(e) => EngineError::RunCommandFailed {
            command: String::new(),
            exit_code: -1,
            stderr_tail: e.to_string(),
        },
        ExecutorError::Verify(e) => EngineError::VerifyFailed {
            name: String::new(),
            summary: e.to_string(),
        },
        ExecutorError::Refs(e) => EngineError::UnknownAlias {
            alias: String::new(),
            reference: e.to_string(),
        },
        ExecutorError::Render(e) => EngineError::ParseError {
            file: std::path::PathBuf::new(),
            line: 0,
            message: e.to_string(),
            fix_hint: None,
        },
        ExecutorError::Session(e) => EngineError::SessionError {
            message: e.to_string(),
            transient: false,
        },
        ExecutorError::Checkpoint(e) => EngineError::SessionError {
            message: e.to_string(),
            transient: false,
        },
        ExecutorError::VerifyFailed { name, summary } => EngineError::VerifyFailed {
            name: name.clone(),
            summary: summary.clone(),
        },
    }
}

/// Soft terminations (the `Ok` path) that still represent a failed or
/// suspended run are rendered the same way as a hard `EngineError`,
/// using the reason's own exit code rather than `EngineError::exit_code`
/// (they don't always agree, e.g. `Consulting` has no `EngineError`
/// counterpart at all).
pub fn termination_to_engine_error(reason: &TerminationReason) -> Option<EngineError> {
    match reason {
        TerminationReason::RunFailed(stderr_tail) => Some(EngineError::RunCommandFailed {
            command: String::new(),
            exit_code: -1,
            stderr_tail: stderr_tail.clone(),
        }),
        TerminationReason::VerifyFailed(summary) => Some(EngineError::VerifyFailed {
            name: String::new(),
            summary: summary.clone(),
        }),
        TerminationReason::RateLimited(detected) => Some(EngineError::RateLimited {
            message: detected.matched_on.clone(),
        }),
        TerminationReason::LoopDetected(detected) => Some(EngineError::LoopDetected {
            reason: format!("{:?}", detected.reason),
            cycle: detected.cycle,
            step: detected.step,
        }),
        TerminationReason::StopFile => Some(EngineError::StopFile {
            path: std::path::PathBuf::from(".stop"),
        }),
        TerminationReason::Paused { message } => Some(EngineError::PauseRequested {
            message: message.clone(),
        }),
        TerminationReason::Consulting { .. } | TerminationReason::MaxCyclesReached => None,
    }
}

/// One-line, human-readable summary for the non-JSON path.
pub fn termination_summary(reason: &TerminationReason) -> String {
    match reason {
        TerminationReason::MaxCyclesReached => "max cycles reached".to_string(),
        TerminationReason::Paused { message } => format!("paused: {message}"),
        TerminationReason::Consulting { topic } => format!("consulting: {topic}"),
        TerminationReason::RunFailed(stderr) => format!("RUN failed: {stderr}"),
        TerminationReason::VerifyFailed(summary) => format!("VERIFY failed: {summary}"),
        TerminationReason::RateLimited(detected) => format!("rate limited: {}", detected.matched_on),
        TerminationReason::LoopDetected(detected) => {
            format!("loop detected: {:?} (cycle {}, step {})", detected.reason, detected.cycle, detected.step)
        }
        TerminationReason::StopFile => "stop file present".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_cycles_has_no_engine_error() {
        assert!(termination_to_engine_error(&TerminationReason::MaxCyclesReached).is_none());
    }

    #[test]
    fn test_run_failed_maps_to_run_command_failed() {
        let engine_err = termination_to_engine_error(&TerminationReason::RunFailed("boom".to_string()));
        assert!(matches!(engine_err, Some(EngineError::RunCommandFailed { .. })));
    }

    #[test]
    fn test_paused_summary_includes_message() {
        let reason = TerminationReason::Paused { message: "waiting".to_string() };
        assert_eq!(termination_summary(&reason), "paused: waiting");
    }
}
