//! The uniform result shape every verifier (builtin or external plugin)
//! returns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    #[serde(default)]
    pub errors: Vec<VerificationIssue>,
    #[serde(default)]
    pub warnings: Vec<VerificationIssue>,
    pub summary: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationIssue {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
    pub fix_hint: Option<String>,
}

impl VerificationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
            fix_hint: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

impl VerificationResult {
    pub fn ok(summary: impl Into<String>) -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: summary.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn failed(summary: impl Into<String>, errors: Vec<VerificationIssue>) -> Self {
        Self {
            passed: false,
            errors,
            warnings: Vec::new(),
            summary: summary.into(),
            details: serde_json::Value::Null,
        }
    }
}
