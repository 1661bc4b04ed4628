//! `.sdqctl/directives.toml`: the external verifier plugin manifest.
//! Named `.yaml` upstream; this engine's dependency stack carries no
//! YAML crate, so the same schema is read as TOML instead (see
//! DESIGN.md's Open Question decisions).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::VerifyError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectivesManifest {
    pub version: u32,
    #[serde(default)]
    pub directives: BTreeMap<String, BTreeMap<String, PluginEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginEntry {
    pub handler: String,
    #[serde(default)]
    pub description: String,
    pub timeout: Option<u64>,
    #[serde(default)]
    pub args: Vec<PluginArg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginArg {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: String,
    #[serde(default)]
    pub required: bool,
}

pub const MANIFEST_RELATIVE_PATH: &str = ".sdqctl/directives.toml";

pub fn load(workspace_root: &Path) -> Result<Option<DirectivesManifest>, VerifyError> {
    let path = workspace_root.join(MANIFEST_RELATIVE_PATH);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| VerifyError::ManifestReadFailed {
        path: path.clone(),
        source: e,
    })?;
    let manifest: DirectivesManifest =
        toml::from_str(&content).map_err(|e| VerifyError::ManifestParseFailed { path, source: e })?;
    Ok(Some(manifest))
}

/// Substitute the fixed placeholder set in a plugin's `handler` command
/// template: `{root}`, `{workspace}`, `{value}`, `{directive}`.
pub fn substitute_handler(
    template: &str,
    root: &Path,
    workspace: &Path,
    value: &str,
    directive: &str,
) -> String {
    template
        .replace("{root}", &root.display().to_string())
        .replace("{workspace}", &workspace.display().to_string())
        .replace("{value}", value)
        .replace("{directive}", directive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_manifest() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".sdqctl")).unwrap();
        fs::write(
            dir.path().join(".sdqctl/directives.toml"),
            r#"
            version = 1

            [directives.VERIFY.custom-check]
            handler = "scripts/check.sh {root}"
            description = "runs a custom check"
            timeout = 30
            "#,
        )
        .unwrap();

        let manifest = load(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.version, 1);
        let entry = &manifest.directives["VERIFY"]["custom-check"];
        assert_eq!(entry.timeout, Some(30));
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_substitute_handler_placeholders() {
        let out = substitute_handler(
            "{root}/run.sh --value={value} --directive={directive}",
            Path::new("/proj"),
            Path::new("/ws"),
            "opt",
            "VERIFY",
        );
        assert_eq!(out, "/proj/run.sh --value=opt --directive=VERIFY");
    }
}
