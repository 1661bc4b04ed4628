//! The `references` builtin: every `REFCAT`/`CONTEXT` reference in the
//! workflow must resolve. The only builtin with real logic in this
//! engine — link checking, traceability walking, terminology, and
//! assertion verifiers are individually out of scope (spec §1) and
//! ship as pass-through stubs in [`crate::builtin::stub`].

use crate::result::{VerificationIssue, VerificationResult};
use crate::Verifier;
use sdqctl_parser::{StepKind, Workflow};
use sdqctl_refs::{is_excluded, parse_ref, resolve, AliasTable};
use std::collections::HashMap;
use std::path::Path;

pub struct ReferencesVerifier<'a> {
    pub workflow: &'a Workflow,
    pub workspace_root: &'a Path,
    pub cwd: &'a Path,
    pub aliases: &'a AliasTable,
}

impl Verifier for ReferencesVerifier<'_> {
    fn name(&self) -> &str {
        "references"
    }

    fn verify(&self, _options: &HashMap<String, String>) -> VerificationResult {
        let mut errors = Vec::new();
        let mut checked = 0u32;

        for step in &self.workflow.steps {
            let StepKind::Refcat { refs } = &step.kind else {
                continue;
            };
            for token in refs {
                if is_excluded(token) {
                    continue;
                }
                checked += 1;
                match parse_ref(token).and_then(|spec| resolve(&spec, self.workspace_root, self.cwd, self.aliases)) {
                    Ok(excerpts) if excerpts.is_empty() => {
                        errors.push(
                            VerificationIssue::new(format!("reference '{token}' matched no files"))
                                .with_hint("check the glob pattern or path"),
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        errors.push(VerificationIssue::new(format!("reference '{token}': {e}")));
                    }
                }
            }
        }

        if errors.is_empty() {
            VerificationResult::ok(format!("{checked} references resolved"))
        } else {
            VerificationResult::failed(format!("{} of {checked} references failed", errors.len()), errors)
        }
    }
}
