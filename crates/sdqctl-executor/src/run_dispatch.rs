use sdqctl_core::OnErrorPolicy;
use sdqctl_parser::RunStep;
use sdqctl_process::{RunOptions, RunResult};
use std::path::Path;
use std::time::Duration;

/// Outcome of dispatching one RUN step, including retries, for the
/// caller to decide branch selection and output injection.
pub struct RunDispatchOutcome {
    pub last_result: RunResult,
    pub attempts: u32,
}

/// Run `step`'s command, retrying up to `step.retry_count` times on
/// non-zero exit when `retry_prompt` is set. `send_retry_prompt` is
/// invoked once per retry with the retry prompt text (already carrying
/// stderr); retries never advance the cycle counter.
pub async fn dispatch_run<F, Fut>(
    step: &RunStep,
    workspace_root: &Path,
    allow_shell: bool,
    mut send_retry_prompt: F,
) -> Result<RunDispatchOutcome, sdqctl_process::ProcessError>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut options = RunOptions::new(step.command.clone(), allow_shell)
        .with_cwd(step.cwd.clone().unwrap_or_else(|| workspace_root.to_path_buf()))
        .with_env(step.env_additions.iter().cloned().collect::<std::collections::HashMap<_, _>>());
    if let Some(timeout_secs) = step.timeout_secs {
        options = options.with_timeout(Duration::from_secs(timeout_secs));
    }
    if let Some(limit) = step.output_limit_bytes {
        options = options.with_output_limit(limit);
    }

    let max_attempts = step.retry_count.unwrap_or(0) + 1;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let result = sdqctl_process::run(&options).await?;
        if result.success() || attempts >= max_attempts {
            return Ok(RunDispatchOutcome {
                last_result: result,
                attempts,
            });
        }
        if let Some(prompt) = &step.retry_prompt {
            let carrying_stderr = format!("{prompt}\n\n```\n{}\n```", result.stderr.trim());
            send_retry_prompt(carrying_stderr).await;
        } else {
            return Ok(RunDispatchOutcome {
                last_result: result,
                attempts,
            });
        }
    }
}

/// Whether a failed RUN with no attached branches is fatal, per
/// spec.md §4.4's `RUN-ON-ERROR` semantics.
pub fn is_fatal_run_failure(step: &RunStep, result: &RunResult) -> bool {
    if result.success() {
        return false;
    }
    let has_branch = !step.on_failure.is_empty() || !step.on_success.is_empty();
    if has_branch {
        // A branch is deemed to have handled the failure.
        return false;
    }
    matches!(step.on_error, OnErrorPolicy::Stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdqctl_parser::RunStep;

    fn run_step(command: &str) -> RunStep {
        RunStep {
            command: command.to_string(),
            env_additions: Vec::new(),
            cwd: None,
            timeout_secs: None,
            on_error: OnErrorPolicy::Stop,
            output_capture: Default::default(),
            output_limit_bytes: None,
            wait: true,
            retry_count: None,
            retry_prompt: None,
            on_failure: Vec::new(),
            on_success: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_successful_run_does_not_retry() {
        let step = run_step("true");
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let outcome = dispatch_run(&step, dir.path(), true, |_| {
            calls += 1;
            async {}
        })
        .await
        .unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_retry_exhausts_and_reports_last_failure() {
        let mut step = run_step("false");
        step.retry_count = Some(2);
        step.retry_prompt = Some("please retry".to_string());
        let dir = tempfile::tempdir().unwrap();
        let mut calls = 0;
        let outcome = dispatch_run(&step, dir.path(), true, |_| {
            calls += 1;
            async {}
        })
        .await
        .unwrap();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls, 2);
        assert!(!outcome.last_result.success());
    }

    #[tokio::test]
    async fn test_no_retry_prompt_stops_at_first_failure() {
        let step = run_step("false");
        let dir = tempfile::tempdir().unwrap();
        let outcome = dispatch_run(&step, dir.path(), true, |_| async {}).await.unwrap();
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn test_fatal_without_branch_on_stop_policy() {
        let step = run_step("false");
        let failed = sdqctl_process::RunResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_secs(0),
            timed_out: false,
            stdout_truncated: false,
            stderr_truncated: false,
        };
        assert!(is_fatal_run_failure(&step, &failed));
    }

    #[test]
    fn test_not_fatal_when_branch_present() {
        let mut step = run_step("false");
        step.on_failure.push(sdqctl_parser::Step::simple(
            sdqctl_parser::StepKind::Prompt { body: "handle it".to_string() },
        ));
        let failed = sdqctl_process::RunResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_secs(0),
            timed_out: false,
            stdout_truncated: false,
            stderr_truncated: false,
        };
        assert!(!is_fatal_run_failure(&step, &failed));
    }
}
