//! Verifier registry: builtins registered directly, external plugins
//! loaded from the manifest and dispatched by shelling out.

use crate::error::VerifyError;
use crate::manifest::DirectivesManifest;
use crate::plugin::run_plugin;
use crate::result::VerificationResult;
use crate::Verifier;
use std::collections::HashMap;
use std::path::Path;

pub struct VerifierRegistry<'a> {
    builtins: HashMap<String, Box<dyn Verifier + 'a>>,
    manifest: Option<DirectivesManifest>,
}

impl<'a> VerifierRegistry<'a> {
    pub fn new() -> Self {
        Self {
            builtins: HashMap::new(),
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, manifest: Option<DirectivesManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn register(&mut self, verifier: Box<dyn Verifier + 'a>) {
        self.builtins.insert(verifier.name().to_string(), verifier);
    }

    /// Run `name` with `options`. Checks builtins first, falls back to
    /// an external plugin entry under any directive kind in the manifest
    /// (`VERIFY`, `HYGIENE`, `TRACE`).
    pub fn run(
        &self,
        name: &str,
        options: &HashMap<String, String>,
        root: &Path,
        workspace: &Path,
    ) -> Result<VerificationResult, VerifyError> {
        if let Some(verifier) = self.builtins.get(name) {
            return Ok(verifier.verify(options));
        }

        if let Some(manifest) = &self.manifest {
            for (directive_kind, entries) in &manifest.directives {
                if let Some(entry) = entries.get(name) {
                    let value = options
                        .get("value")
                        .cloned()
                        .unwrap_or_default();
                    return run_plugin(name, entry, root, workspace, directive_kind, &value);
                }
            }
        }

        Err(VerifyError::UnknownVerifier(name.to_string()))
    }
}

impl Default for VerifierRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::stub::StubVerifier;

    #[test]
    fn test_builtin_dispatch() {
        let mut registry = VerifierRegistry::new();
        registry.register(Box::new(StubVerifier { name: "links" }));
        let result = registry
            .run("links", &HashMap::new(), Path::new("."), Path::new("."))
            .unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_unknown_verifier_errors() {
        let registry = VerifierRegistry::new();
        let err = registry
            .run("nonexistent", &HashMap::new(), Path::new("."), Path::new("."))
            .unwrap_err();
        assert!(matches!(err, VerifyError::UnknownVerifier(_)));
    }
}
