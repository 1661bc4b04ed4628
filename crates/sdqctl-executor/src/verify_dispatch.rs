use sdqctl_core::OutputCapturePolicy;
use sdqctl_parser::VerifyStep;
use sdqctl_verify::{VerificationResult, VerifierRegistry};
use std::collections::HashMap;
use std::path::Path;

/// Result of running one VERIFY step, paired with the markdown that
/// should be injected into `step_outputs` per its `output_capture`
/// policy (`None` if the policy says nothing should be injected).
pub struct VerifyDispatchOutcome {
    pub result: VerificationResult,
    pub injected_markdown: Option<String>,
}

pub fn dispatch_verify(
    registry: &VerifierRegistry,
    step: &VerifyStep,
    root: &Path,
    workspace: &Path,
) -> Result<VerifyDispatchOutcome, sdqctl_verify::VerifyError> {
    let options: HashMap<String, String> = step.options.iter().cloned().collect();
    let result = registry.run(&step.name, &options, root, workspace)?;
    let should_inject = match step.output_capture {
        OutputCapturePolicy::Always => true,
        OutputCapturePolicy::OnError => !result.passed,
        OutputCapturePolicy::Never => false,
    };
    let injected_markdown = should_inject.then(|| format_result(&step.name, &result));
    Ok(VerifyDispatchOutcome {
        result,
        injected_markdown,
    })
}

fn format_result(name: &str, result: &VerificationResult) -> String {
    let mut out = String::new();
    let status = if result.passed { "PASSED" } else { "FAILED" };
    out.push_str(&format!("**VERIFY {name}: {status}**\n\n{}\n", result.summary));
    if !result.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for issue in &result.errors {
            out.push_str(&format!("- {}\n", format_issue(issue)));
        }
    }
    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for issue in &result.warnings {
            out.push_str(&format!("- {}\n", format_issue(issue)));
        }
    }
    out
}

fn format_issue(issue: &sdqctl_verify::VerificationIssue) -> String {
    let location = match (&issue.file, issue.line) {
        (Some(file), Some(line)) => format!("{file}:{line}: "),
        (Some(file), None) => format!("{file}: "),
        _ => String::new(),
    };
    match &issue.fix_hint {
        Some(hint) => format!("{location}{} (hint: {hint})", issue.message),
        None => format!("{location}{}", issue.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdqctl_verify::VerificationIssue;

    fn sample(passed: bool) -> VerificationResult {
        VerificationResult {
            passed,
            errors: if passed {
                Vec::new()
            } else {
                vec![VerificationIssue::new("missing thing")]
            },
            warnings: Vec::new(),
            summary: "done".to_string(),
            details: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_always_injects_regardless_of_outcome() {
        let md = format_result("x", &sample(true));
        assert!(md.contains("PASSED"));
        let should = matches!(OutputCapturePolicy::Always, OutputCapturePolicy::Always);
        assert!(should);
    }

    #[test]
    fn test_format_includes_errors() {
        let md = format_result("x", &sample(false));
        assert!(md.contains("FAILED"));
        assert!(md.contains("missing thing"));
    }
}
