//! Parse diagnostics: file/line/message/fix-hint, collected in lenient
//! mode or surfaced as the first fatal error in strict mode.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseDiagnostic {
    pub file: PathBuf,
    pub line: u32,
    pub message: String,
    pub fix_hint: Option<String>,
}

impl ParseDiagnostic {
    pub fn new(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
            fix_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)?;
        if let Some(hint) = &self.fix_hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Result of a parse attempt: either a workflow plus non-fatal warnings
/// (lenient mode), or a fatal diagnostic list (strict mode: exactly one).
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Ok {
        workflow: crate::model::Workflow,
        warnings: Vec<ParseDiagnostic>,
    },
    Err(Vec<ParseDiagnostic>),
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ParseFatal(pub ParseDiagnostic);
