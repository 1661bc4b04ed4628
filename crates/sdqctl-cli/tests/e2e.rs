//! End-to-end tests driving the built `sdqctl` binary against fixture
//! workflows, per spec.md §8's numbered scenarios.

use std::path::Path;
use std::process::Command;

fn sdqctl_cmd(tmp: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sdqctl"));
    cmd.current_dir(tmp);
    cmd
}

fn write_workflow(tmp: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = tmp.join(name);
    std::fs::write(&path, text).expect("write fixture workflow");
    path
}

#[test]
fn cli_help_displays_correctly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = sdqctl_cmd(tmp.path())
        .arg("--help")
        .output()
        .expect("failed to run sdqctl --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("render"));
    assert!(stdout.contains("validate"));
}

#[test]
fn validate_accepts_clean_workflow() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(tmp.path(), "w.conv", "MODEL gpt-4\nPROMPT hello\n");

    let output = sdqctl_cmd(tmp.path())
        .args(["validate"])
        .arg(&workflow)
        .output()
        .expect("failed to run sdqctl validate");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn validate_reports_strict_errors_with_nonzero_exit() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(tmp.path(), "bad.conv", "COMPACTION-MIN 150\nPROMPT hi\n");

    let output = sdqctl_cmd(tmp.path())
        .args(["validate"])
        .arg(&workflow)
        .output()
        .expect("failed to run sdqctl validate");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("0-100"));
}

#[test]
fn render_emits_a_cycle_envelope() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(tmp.path(), "w.conv", "MODEL gpt-4\nPROMPT hello\n");

    let output = sdqctl_cmd(tmp.path())
        .args(["render"])
        .arg(&workflow)
        .args(["--cycle", "1"])
        .output()
        .expect("failed to run sdqctl render");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON envelope");
    assert!(json.get("prompts").is_some());
}

#[test]
fn run_dry_run_completes_without_executing_run_steps() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(
        tmp.path(),
        "w.conv",
        "MODEL gpt-4\nALLOW-SHELL true\nRUN touch should-not-exist\nPROMPT hello\n",
    );

    let output = sdqctl_cmd(tmp.path())
        .args(["run"])
        .arg(&workflow)
        .args(["--adapter", "mock", "--dry-run"])
        .output()
        .expect("failed to run sdqctl run --dry-run");

    assert!(output.status.success());
    assert!(!tmp.path().join("should-not-exist").exists());
}

#[test]
fn run_to_completion_with_mock_adapter_reaches_max_cycles() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(tmp.path(), "w.conv", "MODEL gpt-4\nMAX-CYCLES 1\nPROMPT hello\n");

    let output = sdqctl_cmd(tmp.path())
        .args(["run"])
        .arg(&workflow)
        .args(["--adapter", "mock"])
        .output()
        .expect("failed to run sdqctl run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn run_pauses_at_checkpoint_with_exit_code_six() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(
        tmp.path(),
        "w.conv",
        "MODEL gpt-4\nMAX-CYCLES 1\nPROMPT hello\nCHECKPOINT\nCHECKPOINT-PAUSE\n",
    );

    let output = sdqctl_cmd(tmp.path())
        .args(["run"])
        .arg(&workflow)
        .args(["--adapter", "mock"])
        .output()
        .expect("failed to run sdqctl run");
    assert_eq!(output.status.code(), Some(6), "expected PAUSE exit code 6");
}

#[test]
fn run_resume_without_a_checkpoint_fails_fast() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workflow = write_workflow(tmp.path(), "w.conv", "MODEL gpt-4\nMAX-CYCLES 1\nPROMPT hello\n");

    let output = sdqctl_cmd(tmp.path())
        .args(["run"])
        .arg(&workflow)
        .args(["--adapter", "mock", "--resume"])
        .output()
        .expect("failed to run sdqctl run --resume");
    assert!(!output.status.success());
}
