//! Placeholder builtins for the verifiers spec §1 marks as individually
//! out of scope: link checking, traceability chain walking, terminology
//! consistency, and assertion checking. They satisfy the registry's
//! uniform result shape so `VERIFY links`/`VERIFY traceability`/etc.
//! parse and dispatch, but report themselves unimplemented rather than
//! silently passing. Project-specific logic belongs in an external
//! plugin manifest entry instead.

use crate::result::VerificationResult;
use crate::Verifier;
use std::collections::HashMap;

pub struct StubVerifier {
    pub name: &'static str,
}

impl Verifier for StubVerifier {
    fn name(&self) -> &str {
        self.name
    }

    fn verify(&self, _options: &HashMap<String, String>) -> VerificationResult {
        let mut result = VerificationResult::ok(format!(
            "'{}' has no builtin implementation in this engine; register an external plugin in .sdqctl/directives.toml",
            self.name
        ));
        result.warnings.push(crate::result::VerificationIssue::new(format!(
            "builtin verifier '{}' is a no-op stub",
            self.name
        )));
        result
    }
}

pub fn stubs() -> Vec<StubVerifier> {
    vec![
        StubVerifier { name: "links" },
        StubVerifier { name: "traceability" },
        StubVerifier { name: "terminology" },
        StubVerifier { name: "assertions" },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_passes_with_warning() {
        let v = StubVerifier { name: "links" };
        let result = v.verify(&HashMap::new());
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
    }
}
