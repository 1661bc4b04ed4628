//! Executes an external verifier plugin: exit code 0 is a pass, stdout
//! becomes the summary, stderr becomes the error message on failure.

use crate::error::VerifyError;
use crate::manifest::{substitute_handler, PluginEntry};
use crate::result::{VerificationIssue, VerificationResult};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_plugin(
    name: &str,
    entry: &PluginEntry,
    root: &Path,
    workspace: &Path,
    directive: &str,
    value: &str,
) -> Result<VerificationResult, VerifyError> {
    let command_line = substitute_handler(&entry.handler, root, workspace, value, directive);
    let timeout = Duration::from_secs(entry.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

    let mut parts = command_line.split_whitespace();
    let program = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let mut child = Command::new(program)
        .args(&args)
        .current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VerifyError::PluginLaunchFailed {
            name: name.to_string(),
            source: e,
        })?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VerifyError::PluginTimedOut {
                        name: name.to_string(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                return Err(VerifyError::PluginLaunchFailed {
                    name: name.to_string(),
                    source: e,
                })
            }
        }
    }

    let output = child.wait_with_output().map_err(|e| VerifyError::PluginLaunchFailed {
        name: name.to_string(),
        source: e,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(VerificationResult::ok(stdout.trim().to_string()))
    } else {
        Ok(VerificationResult::failed(
            format!("external verifier '{name}' reported failure"),
            vec![VerificationIssue::new(stderr.trim().to_string())],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_passing_plugin() {
        let dir = TempDir::new().unwrap();
        let entry = PluginEntry {
            handler: "true".to_string(),
            description: String::new(),
            timeout: Some(5),
            args: Vec::new(),
        };
        let result = run_plugin("ok", &entry, dir.path(), dir.path(), "VERIFY", "").unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_failing_plugin() {
        let dir = TempDir::new().unwrap();
        let entry = PluginEntry {
            handler: "false".to_string(),
            description: String::new(),
            timeout: Some(5),
            args: Vec::new(),
        };
        let result = run_plugin("bad", &entry, dir.path(), dir.path(), "VERIFY", "").unwrap();
        assert!(!result.passed);
    }

    #[test]
    fn test_plugin_timeout() {
        let dir = TempDir::new().unwrap();
        let entry = PluginEntry {
            handler: "sleep 5".to_string(),
            description: String::new(),
            timeout: Some(0),
            args: Vec::new(),
        };
        let err = run_plugin("slow", &entry, dir.path(), dir.path(), "VERIFY", "").unwrap_err();
        assert!(matches!(err, VerifyError::PluginTimedOut { .. }));
    }
}
