//! Engine error taxonomy.
//!
//! Variants mirror the error table in the specification one-for-one:
//! each carries enough context to render a one-line summary, an
//! optional fix hint, and a stable process exit code.

use std::path::PathBuf;

/// Top-level engine error kind. Internal plumbing uses `anyhow::Result`;
/// call sites that need a stable exit code or a `--json-errors` body
/// downcast into this enum at the CLI boundary.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("parse error at {file}:{line}: {message}")]
    ParseError {
        file: PathBuf,
        line: u32,
        message: String,
        fix_hint: Option<String>,
    },

    #[error("missing context file(s): {}", .paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    MissingContextFiles { paths: Vec<PathBuf> },

    #[error("unknown alias '{alias}' in reference '{reference}'")]
    UnknownAlias { alias: String, reference: String },

    #[error("command failed (exit {exit_code}): {command}")]
    RunCommandFailed {
        command: String,
        exit_code: i32,
        stderr_tail: String,
    },

    #[error("verifier '{name}' failed: {summary}")]
    VerifyFailed { name: String, summary: String },

    #[error("loop detected: {reason} (cycle {cycle}, step {step})")]
    LoopDetected {
        reason: String,
        cycle: u32,
        step: usize,
    },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("session error: {message}")]
    SessionError { message: String, transient: bool },

    #[error("execution paused: {message}")]
    PauseRequested { message: String },

    #[error("stop file present: {path}")]
    StopFile { path: PathBuf },

    #[error("consultation expired: {reason}")]
    ConsultTimeout { reason: String },
}

impl EngineError {
    /// Process exit code per the specification's exit code table.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::VerifyFailed { .. } => 1,
            EngineError::ParseError { .. } | EngineError::MissingContextFiles { .. } => 2,
            EngineError::RunCommandFailed { .. } => 3,
            EngineError::LoopDetected { .. } | EngineError::StopFile { .. } => 4,
            EngineError::RateLimited { .. } => 5,
            EngineError::PauseRequested { .. } => 6,
            EngineError::UnknownAlias { .. } => 2,
            EngineError::SessionError { .. } => 3,
            EngineError::ConsultTimeout { .. } => 2,
        }
    }

    /// A short fix hint, when one is known, for user-facing display.
    pub fn fix_hint(&self) -> Option<&str> {
        match self {
            EngineError::ParseError { fix_hint, .. } => fix_hint.as_deref(),
            EngineError::MissingContextFiles { .. } => {
                Some("add CONTEXT-OPTIONAL or set VALIDATION-MODE lenient")
            }
            EngineError::UnknownAlias { .. } => {
                Some("register the alias in workspace.lock.json or use a literal path")
            }
            _ => None,
        }
    }

    /// JSON body for `--json-errors`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "type": self.kind_name(),
                "message": self.to_string(),
                "exit_code": self.exit_code(),
                "fix_hint": self.fix_hint(),
            }
        })
    }

    fn kind_name(&self) -> &'static str {
        match self {
            EngineError::ParseError { .. } => "ParseError",
            EngineError::MissingContextFiles { .. } => "MissingContextFiles",
            EngineError::UnknownAlias { .. } => "UnknownAlias",
            EngineError::RunCommandFailed { .. } => "RunCommandFailed",
            EngineError::VerifyFailed { .. } => "VerifyFailed",
            EngineError::LoopDetected { .. } => "LoopDetected",
            EngineError::RateLimited { .. } => "RateLimited",
            EngineError::SessionError { .. } => "SessionError",
            EngineError::PauseRequested { .. } => "PauseRequested",
            EngineError::StopFile { .. } => "StopFile",
            EngineError::ConsultTimeout { .. } => "ConsultTimeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_spec_table() {
        assert_eq!(
            EngineError::VerifyFailed {
                name: "refs".into(),
                summary: "bad".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(
            EngineError::ParseError {
                file: "w.conv".into(),
                line: 1,
                message: "bad".into(),
                fix_hint: None
            }
            .exit_code(),
            2
        );
        assert_eq!(
            EngineError::RunCommandFailed {
                command: "x".into(),
                exit_code: 1,
                stderr_tail: String::new()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            EngineError::LoopDetected {
                reason: "x".into(),
                cycle: 1,
                step: 0
            }
            .exit_code(),
            4
        );
        assert_eq!(
            EngineError::RateLimited {
                message: "x".into()
            }
            .exit_code(),
            5
        );
        assert_eq!(
            EngineError::PauseRequested {
                message: "x".into()
            }
            .exit_code(),
            6
        );
    }

    #[test]
    fn test_json_errors_shape() {
        let err = EngineError::RateLimited {
            message: "429".into(),
        };
        let json = err.to_json();
        assert_eq!(json["error"]["type"], "RateLimited");
        assert_eq!(json["error"]["exit_code"], 5);
    }

    #[test]
    fn test_missing_context_files_message_lists_paths() {
        let err = EngineError::MissingContextFiles {
            paths: vec![PathBuf::from("a.md"), PathBuf::from("b.md")],
        };
        assert!(err.to_string().contains("a.md"));
        assert!(err.to_string().contains("b.md"));
    }
}
