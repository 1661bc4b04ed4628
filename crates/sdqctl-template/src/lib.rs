//! Fixed-variable template substitution for prompt bodies and path
//! templates (`DATE`, `GIT_BRANCH`, `GIT_COMMIT`, `CWD`, `STOP_FILE`,
//! `WORKFLOW_NAME`, plus cycle variables added per-cycle by the renderer).
//!
//! Substitution is single-pass: the scanner never re-reads text it has
//! already emitted, so a variable whose *value* happens to contain
//! `{OTHER_VAR}` is never expanded recursively. This mirrors the
//! single-pass substitution the hook runner in this codebase's closest
//! sibling uses to prevent double-substitution attacks, generalized
//! from shell-escaped output to plain text since a prompt body is not a
//! shell command line.

use sdqctl_core::{TemplateVars, WORKFLOW_NAME_SENTINEL};

/// Where the substitution is happening; controls whether `WORKFLOW_NAME`
/// is eligible (excluded from prompt bodies by default; always
/// substituted in path templates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionContext {
    /// A prompt body sent to the agent.
    PromptBody,
    /// An `OUTPUT-FILE`/`OUTPUT-DIR` path template.
    PathTemplate,
}

/// Substitute `{VAR}` placeholders in `template` using `vars`.
///
/// Unknown placeholders are left verbatim. In `PromptBody` context,
/// `{WORKFLOW_NAME}` is left verbatim *unless* the explicit sentinel
/// `__WORKFLOW_NAME__` appears in the template, in which case the
/// sentinel itself (not `{WORKFLOW_NAME}`) is replaced.
pub fn substitute(template: &str, vars: &TemplateVars, ctx: SubstitutionContext) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            let mut key = String::new();
            let mut found_close = false;
            for inner in chars.by_ref() {
                if inner == '}' {
                    found_close = true;
                    break;
                }
                key.push(inner);
            }
            if !found_close {
                result.push('{');
                result.push_str(&key);
                continue;
            }
            if key == "WORKFLOW_NAME" && ctx == SubstitutionContext::PromptBody {
                // Excluded from prompt bodies by default; leave verbatim.
                result.push('{');
                result.push_str(&key);
                result.push('}');
                continue;
            }
            match vars.get(&key) {
                Some(value) => result.push_str(value),
                None => {
                    result.push('{');
                    result.push_str(&key);
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    if ctx == SubstitutionContext::PromptBody {
        if let Some(name) = vars.get("WORKFLOW_NAME") {
            result = result.replace(WORKFLOW_NAME_SENTINEL, name);
        }
    }

    result
}
