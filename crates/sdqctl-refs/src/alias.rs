//! Alias resolution: explicit dict → `workspace.lock.json` (ancestor
//! walk) → user-global aliases. Grounded on the teacher's
//! `weave_lock.rs` atomic-load pattern, adapted from TOML to JSON, and
//! its `global.rs` user-config loading for the last tier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RefError;

const LOCK_FILENAME: &str = "workspace.lock.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceLock {
    #[serde(default)]
    pub externals_dir: Option<String>,
    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepoEntry {
    pub alias: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub name: String,
}

/// Resolved alias table: alias name → absolute root directory.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    roots: HashMap<String, PathBuf>,
}

impl AliasTable {
    pub fn resolve(&self, alias: &str) -> Option<&Path> {
        self.roots.get(alias).map(PathBuf::as_path)
    }

    pub fn insert(&mut self, alias: impl Into<String>, root: impl Into<PathBuf>) {
        self.roots.insert(alias.into(), root.into());
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.roots.contains_key(alias)
    }
}

/// Build the effective alias table for `workspace_root`, in resolution
/// order: `explicit` (highest priority, e.g. CLI-supplied overrides),
/// `workspace.lock.json` walked from `workspace_root` up through its
/// ancestors, then `user_global` (lowest priority fallback).
pub fn build_alias_table(
    workspace_root: &Path,
    explicit: &HashMap<String, PathBuf>,
    user_global: &HashMap<String, PathBuf>,
) -> Result<AliasTable, RefError> {
    let mut table = AliasTable::default();

    for (alias, root) in user_global {
        table.insert(alias.clone(), root.clone());
    }

    if let Some(lock) = find_workspace_lock(workspace_root)? {
        let externals_dir = lock
            .externals_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| workspace_root.to_path_buf());
        for repo in &lock.repos {
            let root = externals_dir.join(&repo.name);
            table.insert(repo.alias.clone(), root.clone());
            for extra in &repo.aliases {
                table.insert(extra.clone(), root.clone());
            }
        }
    }

    for (alias, root) in explicit {
        table.insert(alias.clone(), root.clone());
    }

    Ok(table)
}

/// Walk `start` and its ancestors looking for `workspace.lock.json`,
/// returning the first one found.
fn find_workspace_lock(start: &Path) -> Result<Option<WorkspaceLock>, RefError> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join(LOCK_FILENAME);
        if candidate.is_file() {
            let content = fs::read_to_string(&candidate).map_err(|e| RefError::ReadFailed {
                path: candidate.clone(),
                source: e,
            })?;
            let lock: WorkspaceLock =
                serde_json::from_str(&content).map_err(|e| RefError::LockParseFailed {
                    path: candidate.clone(),
                    source: e,
                })?;
            return Ok(Some(lock));
        }
        dir = d.parent();
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ancestor_walk_finds_lock_in_parent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let sub = root.join("a/b");
        fs::create_dir_all(&sub).unwrap();
        fs::write(
            root.join("workspace.lock.json"),
            r#"{"externals_dir":"ext","repos":[{"alias":"util","name":"util-repo"}]}"#,
        )
        .unwrap();

        let table = build_alias_table(&sub, &HashMap::new(), &HashMap::new()).unwrap();
        assert!(table.contains("util"));
        assert_eq!(table.resolve("util"), Some(root.join("ext/util-repo").as_path()));
    }

    #[test]
    fn test_explicit_overrides_lock() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("workspace.lock.json"),
            r#"{"repos":[{"alias":"util","name":"util-repo"}]}"#,
        )
        .unwrap();
        let mut explicit = HashMap::new();
        explicit.insert("util".to_string(), PathBuf::from("/override"));

        let table = build_alias_table(dir.path(), &explicit, &HashMap::new()).unwrap();
        assert_eq!(table.resolve("util"), Some(Path::new("/override")));
    }

    #[test]
    fn test_no_lock_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let table = build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        assert!(!table.contains("anything"));
    }

    #[test]
    fn test_repo_aliases_list_all_map_to_same_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("workspace.lock.json"),
            r#"{"repos":[{"alias":"util","aliases":["u","utils"],"name":"util-repo"}]}"#,
        )
        .unwrap();
        let table = build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        assert_eq!(table.resolve("util"), table.resolve("u"));
        assert_eq!(table.resolve("util"), table.resolve("utils"));
    }
}
