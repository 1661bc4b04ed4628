//! Resolve a `RefSpec` into one or more file excerpts, with the
//! `## From: path:L_start-L_end (relative to CWD)` attribution line
//! the renderer expects. Path-traversal boundary check is grounded on
//! the teacher's `context_loader.rs::try_load_file`.

use crate::alias::AliasTable;
use crate::error::RefError;
use crate::spec::RefSpec;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Path as it should be displayed, relative to `cwd` when possible.
    pub display_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub content: String,
}

impl Excerpt {
    pub fn attribution(&self) -> String {
        format!(
            "## From: {}:L{}-L{} (relative to CWD)",
            self.display_path, self.line_start, self.line_end
        )
    }
}

/// Resolve `spec` against `workspace_root`/`cwd`, returning one excerpt
/// per matched file (more than one only for pattern refs).
pub fn resolve(
    spec: &RefSpec,
    workspace_root: &Path,
    cwd: &Path,
    aliases: &AliasTable,
) -> Result<Vec<Excerpt>, RefError> {
    let root = match &spec.alias {
        Some(alias) => aliases
            .resolve(alias)
            .ok_or_else(|| RefError::UnknownAlias {
                alias: alias.clone(),
            })?
            .to_path_buf(),
        None => workspace_root.to_path_buf(),
    };

    if spec.pattern {
        resolve_pattern(spec, &root, cwd)
    } else {
        let full = root.join(&spec.path);
        let excerpt = load_one(spec, &root, &full, cwd)?;
        Ok(vec![excerpt])
    }
}

fn resolve_pattern(spec: &RefSpec, root: &Path, cwd: &Path) -> Result<Vec<Excerpt>, RefError> {
    let pattern = root.join(&spec.path);
    let pattern_str = pattern.to_string_lossy();
    let mut out = Vec::new();
    for entry in glob::glob(&pattern_str).into_iter().flatten() {
        let Ok(path) = entry else { continue };
        if path.is_file() {
            out.push(load_one(spec, root, &path, cwd)?);
        }
    }
    out.sort_by(|a, b| a.display_path.cmp(&b.display_path));
    Ok(out)
}

fn load_one(spec: &RefSpec, root: &Path, full: &Path, cwd: &Path) -> Result<Excerpt, RefError> {
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let canonical_file = full
        .canonicalize()
        .map_err(|_| RefError::FileNotFound {
            path: full.to_path_buf(),
        })?;
    if !canonical_file.starts_with(&canonical_root) {
        return Err(RefError::PathEscapesRoot {
            path: full.to_path_buf(),
        });
    }

    let content = fs::read_to_string(&canonical_file).map_err(|e| RefError::ReadFailed {
        path: canonical_file.clone(),
        source: e,
    })?;
    let lines: Vec<&str> = content.lines().collect();

    let total = lines.len() as u32;
    let start = spec.line_start.unwrap_or(1).max(1);
    let end = spec.line_end.unwrap_or(total).min(total.max(1));
    let start = start.saturating_sub(spec.relative_before).max(1);
    let end = (end + spec.relative_after).min(total.max(1));

    let slice = if total == 0 {
        String::new()
    } else {
        lines[(start as usize - 1).min(lines.len().saturating_sub(1))
            ..(end as usize).min(lines.len())]
            .join("\n")
    };

    let display_path = display_relative(&canonical_file, cwd);

    Ok(Excerpt {
        display_path,
        line_start: start,
        line_end: end,
        content: slice,
    })
}

fn display_relative(path: &Path, cwd: &Path) -> String {
    let canonical_cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
    match path.strip_prefix(&canonical_cwd) {
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(path: &str) -> RefSpec {
        RefSpec {
            alias: None,
            path: path.to_string(),
            line_start: None,
            line_end: None,
            pattern: path.contains('*'),
            relative_before: 0,
            relative_after: 0,
        }
    }

    #[test]
    fn test_load_whole_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let excerpts = resolve(&spec("a.txt"), dir.path(), dir.path(), &AliasTable::default()).unwrap();
        assert_eq!(excerpts.len(), 1);
        assert_eq!(excerpts[0].content, "one\ntwo\nthree");
        assert_eq!(excerpts[0].line_start, 1);
        assert_eq!(excerpts[0].line_end, 3);
    }

    #[test]
    fn test_load_line_range() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\nfour\n").unwrap();
        let mut s = spec("a.txt");
        s.line_start = Some(2);
        s.line_end = Some(3);
        let excerpts = resolve(&s, dir.path(), dir.path(), &AliasTable::default()).unwrap();
        assert_eq!(excerpts[0].content, "two\nthree");
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("secret.txt"), "nope").unwrap();
        let err = resolve(&spec("../secret.txt"), &sub, &sub, &AliasTable::default()).unwrap_err();
        assert!(matches!(err, RefError::PathEscapesRoot { .. }));
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = resolve(&spec("nope.txt"), dir.path(), dir.path(), &AliasTable::default()).unwrap_err();
        assert!(matches!(err, RefError::FileNotFound { .. }));
    }

    #[test]
    fn test_pattern_matches_multiple_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();
        let excerpts = resolve(&spec("*.rs"), dir.path(), dir.path(), &AliasTable::default()).unwrap();
        assert_eq!(excerpts.len(), 2);
    }

    #[test]
    fn test_unknown_alias_errors() {
        let dir = TempDir::new().unwrap();
        let mut s = spec("x.txt");
        s.alias = Some("nope".to_string());
        let err = resolve(&s, dir.path(), dir.path(), &AliasTable::default()).unwrap_err();
        assert!(matches!(err, RefError::UnknownAlias { .. }));
    }

    #[test]
    fn test_attribution_format() {
        let e = Excerpt {
            display_path: "src/main.rs".to_string(),
            line_start: 10,
            line_end: 20,
            content: String::new(),
        };
        assert_eq!(e.attribution(), "## From: src/main.rs:L10-L20 (relative to CWD)");
    }
}
