//! The verifier registry: `Verifier.verify(root, options) ->
//! VerificationResult`. Builtins run in-process; external plugins are
//! manifest entries that shell out, with exit code 0 read as a pass.

pub mod builtin;
pub mod error;
pub mod manifest;
pub mod plugin;
pub mod registry;
pub mod result;
pub mod scan;

pub use error::VerifyError;
pub use registry::VerifierRegistry;
pub use result::{VerificationIssue, VerificationResult};

use std::collections::HashMap;

pub trait Verifier {
    fn name(&self) -> &str;
    fn verify(&self, options: &HashMap<String, String>) -> VerificationResult;
}

/// Build a registry with every shipped builtin registered and the
/// workspace's plugin manifest (if any) loaded.
pub fn default_registry<'a>(
    workflow: &'a sdqctl_parser::Workflow,
    workspace_root: &'a std::path::Path,
    cwd: &'a std::path::Path,
    aliases: &'a sdqctl_refs::AliasTable,
) -> Result<VerifierRegistry<'a>, VerifyError> {
    let mut registry = VerifierRegistry::new().with_manifest(manifest::load(workspace_root)?);
    registry.register(Box::new(builtin::ReferencesVerifier {
        workflow,
        workspace_root,
        cwd,
        aliases,
    }));
    for stub in builtin::stubs() {
        registry.register(Box::new(stub));
    }
    Ok(registry)
}
