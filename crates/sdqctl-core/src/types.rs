//! Shared closed-enum types used across the engine crates.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output format for the rendered envelope / CLI summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum OutputFormat {
    Json,
    Text,
}

/// Parse/validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum ValidationMode {
    #[default]
    Strict,
    Lenient,
}

/// What to do when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnErrorPolicy {
    #[default]
    Stop,
    Continue,
    Warn,
}

/// When to capture and inject a step's output into subsequent context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputCapturePolicy {
    OnError,
    #[default]
    Always,
    Never,
}

/// Session mode policy selecting how the session is handled between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    #[default]
    Accumulate,
    Compact,
    Fresh,
}

/// Fixed template variable table. Insertion order does not matter;
/// `BTreeMap` gives deterministic iteration for byte-identical rendering.
pub type TemplateVars = BTreeMap<String, String>;

/// The fixed set of builtin template variable names.
pub const BUILTIN_TEMPLATE_VARS: &[&str] = &[
    "DATE",
    "GIT_BRANCH",
    "GIT_COMMIT",
    "CWD",
    "STOP_FILE",
    "WORKFLOW_NAME",
    "CYCLE_NUMBER",
    "ITERATION_INDEX",
    "ITERATION_TOTAL",
];

/// Sentinel that forces substitution of `WORKFLOW_NAME` inside a prompt body,
/// which is otherwise excluded from prompt-body substitution by default.
pub const WORKFLOW_NAME_SENTINEL: &str = "__WORKFLOW_NAME__";

/// Patterns (case-insensitive substrings) that mark an environment variable
/// key as sensitive; matching values are masked wherever serialized.
pub const SENSITIVE_ENV_KEY_PATTERNS: &[&str] =
    &["KEY", "SECRET", "TOKEN", "PASSWORD", "AUTH", "CREDENTIAL"];

/// Whether an environment variable key name looks sensitive.
pub fn is_sensitive_env_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    SENSITIVE_ENV_KEY_PATTERNS
        .iter()
        .any(|pat| upper.contains(pat))
}

/// Mask a map of environment variables for serialization: sensitive values
/// become `"***"`, everything else passes through unchanged.
pub fn mask_env(env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            if is_sensitive_env_key(k) {
                (k.clone(), "***".to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sensitive_env_key() {
        assert!(is_sensitive_env_key("API_KEY"));
        assert!(is_sensitive_env_key("my_secret_value"));
        assert!(is_sensitive_env_key("AUTH_TOKEN"));
        assert!(is_sensitive_env_key("DB_PASSWORD"));
        assert!(is_sensitive_env_key("AWS_CREDENTIAL_FILE"));
        assert!(!is_sensitive_env_key("PATH"));
        assert!(!is_sensitive_env_key("HOME"));
    }

    #[test]
    fn test_mask_env_masks_only_sensitive() {
        let mut env = BTreeMap::new();
        env.insert("API_KEY".to_string(), "sk-abc123".to_string());
        env.insert("PATH".to_string(), "/usr/bin".to_string());

        let masked = mask_env(&env);
        assert_eq!(masked["API_KEY"], "***");
        assert_eq!(masked["PATH"], "/usr/bin");
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
    }
}
