use crate::error::ProcessError;
use crate::options::RunOptions;
use crate::result::RunResult;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

const READ_BUF_SIZE: usize = 4096;

/// Run a `RUN` step's shell command to completion, enforcing the
/// `ALLOW-SHELL` gate, a hard timeout, and a byte-capped output buffer.
///
/// Shells out via `sh -c` so the full RUN command string (pipes,
/// redirection, globs) behaves the way the author wrote it. The child is
/// placed in its own process group; on timeout the whole group is sent
/// `SIGKILL` rather than just the immediate child, so shell pipelines
/// don't leave orphans behind.
pub async fn run(options: &RunOptions) -> Result<RunResult, ProcessError> {
    if !options.allow_shell {
        return Err(ProcessError::ShellNotAllowed {
            command: options.command.clone(),
        });
    }

    let started = Instant::now();

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(&options.command);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env_additions {
        cmd.env(key, value);
    }
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.stdin(std::process::Stdio::null());
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    debug!(
        command = %options.command,
        env_keys = ?masked_keys(&options.env_additions),
        "spawning RUN command"
    );

    let mut child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
        command: options.command.clone(),
        source: e,
    })?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let capture = tokio::time::timeout(
        options.timeout,
        capture_output(stdout, stderr, options.output_limit_bytes),
    )
    .await;

    let (stdout_buf, stdout_truncated, stderr_buf, stderr_truncated, timed_out) = match capture {
        Ok(Ok(captured)) => (captured.0, captured.1, captured.2, captured.3, false),
        Ok(Err(e)) => {
            return Err(ProcessError::CaptureFailed {
                command: options.command.clone(),
                source: e,
            })
        }
        Err(_) => {
            warn!(command = %options.command, timeout_secs = options.timeout.as_secs(), "RUN command timed out, killing process group");
            kill_process_group(&child);
            (String::new(), false, String::new(), false, true)
        }
    };

    let exit_code = if timed_out {
        let _ = child.wait().await;
        137
    } else {
        child
            .wait()
            .await
            .map_err(|e| ProcessError::CaptureFailed {
                command: options.command.clone(),
                source: e,
            })?
            .code()
            .unwrap_or(1)
    };

    Ok(RunResult {
        exit_code,
        stdout: stdout_buf,
        stderr: stderr_buf,
        duration: started.elapsed(),
        timed_out,
        stdout_truncated,
        stderr_truncated,
    })
}

async fn capture_output(
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
    limit: usize,
) -> std::io::Result<(String, bool, String, bool)> {
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_truncated = false;
    let mut stderr_truncated = false;

    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut read_buf = [0u8; READ_BUF_SIZE];

    while !stdout_done || !stderr_done {
        tokio::select! {
            n = stdout_reader.read(&mut read_buf), if !stdout_done => {
                match n? {
                    0 => stdout_done = true,
                    n => append_capped(&mut stdout_buf, &read_buf[..n], limit, &mut stdout_truncated),
                }
            }
            n = stderr_reader.read(&mut read_buf), if !stderr_done => {
                match n? {
                    0 => stderr_done = true,
                    n => append_capped(&mut stderr_buf, &read_buf[..n], limit, &mut stderr_truncated),
                }
            }
        }
    }

    Ok((
        String::from_utf8_lossy(&stdout_buf).into_owned(),
        stdout_truncated,
        String::from_utf8_lossy(&stderr_buf).into_owned(),
        stderr_truncated,
    ))
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
    if buf.len() >= limit {
        *truncated = true;
        return;
    }
    let remaining = limit - buf.len();
    if chunk.len() > remaining {
        buf.extend_from_slice(&chunk[..remaining]);
        *truncated = true;
    } else {
        buf.extend_from_slice(chunk);
    }
}

fn kill_process_group(child: &tokio::process::Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(-(pid as i32), libc::SIGKILL);
            }
            return;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child;
    }
}

fn masked_keys(env: &std::collections::HashMap<String, String>) -> Vec<String> {
    let as_map: BTreeMap<String, String> = env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    sdqctl_core::types::mask_env(&as_map).keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_successful_run_captures_stdout() {
        let options = RunOptions::new("echo hello", true);
        let result = run(&options).await.unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "hello");
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let options = RunOptions::new("exit 3", true);
        let result = run(&options).await.unwrap();
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_shell_not_allowed_refuses() {
        let options = RunOptions::new("echo hello", false);
        let err = run(&options).await.unwrap_err();
        assert!(matches!(err, ProcessError::ShellNotAllowed { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let options = RunOptions::new("sleep 5", true).with_timeout(Duration::from_millis(100));
        let result = run(&options).await.unwrap();
        assert!(result.timed_out);
        assert_eq!(result.exit_code, 137);
    }

    #[tokio::test]
    async fn test_output_is_truncated_at_limit() {
        let options = RunOptions::new("yes | head -c 100000", true).with_output_limit(10);
        let result = run(&options).await.unwrap();
        assert!(result.stdout_truncated);
        assert_eq!(result.stdout.len(), 10);
    }

    #[tokio::test]
    async fn test_env_additions_are_visible_to_child() {
        let mut env = std::collections::HashMap::new();
        env.insert("SDQCTL_TEST_VAR".to_string(), "present".to_string());
        let options = RunOptions::new("echo $SDQCTL_TEST_VAR", true).with_env(env);
        let result = run(&options).await.unwrap();
        assert_eq!(result.stdout.trim(), "present");
    }

    #[tokio::test]
    async fn test_cwd_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions::new("pwd", true).with_cwd(dir.path().to_path_buf());
        let result = run(&options).await.unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(result.stdout.trim(), canonical.to_string_lossy());
    }
}
