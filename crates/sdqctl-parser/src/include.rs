//! `INCLUDE path` splicing: flattens a workflow file and any files it
//! transitively includes into a single `(file, line_no, raw_line)`
//! stream, rejecting cycles.

use crate::diagnostics::ParseDiagnostic;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Read `path` and recursively splice `INCLUDE <other>` lines, in place,
/// at the position they occur. `visited` tracks canonicalized paths
/// currently on the inclusion stack to detect cycles.
pub fn flatten(path: &Path) -> Result<Vec<(PathBuf, u32, String)>, ParseDiagnostic> {
    let mut visited = HashSet::new();
    flatten_inner(path, &mut visited)
}

fn flatten_inner(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<Vec<(PathBuf, u32, String)>, ParseDiagnostic> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        return Err(ParseDiagnostic::new(
            path,
            0,
            format!("INCLUDE cycle detected at '{}'", path.display()),
        )
        .with_hint("remove the circular INCLUDE chain"));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ParseDiagnostic::new(path, 0, format!("cannot read workflow file: {e}"))
    })?;

    let mut out = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let trimmed = raw.trim_start();
        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        if !indented {
            if let Some(rest) = trimmed.strip_prefix("INCLUDE") {
                let rest = rest.trim();
                if !rest.is_empty() && (trimmed == "INCLUDE" || trimmed.starts_with("INCLUDE ")) {
                    let include_path = resolve_include_path(path, rest);
                    let spliced = flatten_inner(&include_path, visited)?;
                    out.extend(spliced);
                    continue;
                }
            }
        }
        out.push((path.to_path_buf(), line_no, raw.to_string()));
    }

    visited.remove(&canonical);
    Ok(out)
}

fn resolve_include_path(including_file: &Path, value: &str) -> PathBuf {
    let candidate = PathBuf::from(value.trim());
    if candidate.is_absolute() {
        return candidate;
    }
    including_file
        .parent()
        .map(|dir| dir.join(&candidate))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flatten_single_file_no_includes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("w.conv");
        fs::write(&file, "MODEL gpt\nPROMPT hi\n").unwrap();

        let lines = flatten(&file).unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_flatten_splices_include() {
        let dir = TempDir::new().unwrap();
        let included = dir.path().join("shared.conv");
        fs::write(&included, "HEADER shared-header\n").unwrap();
        let main = dir.path().join("w.conv");
        fs::write(&main, "MODEL gpt\nINCLUDE shared.conv\nPROMPT hi\n").unwrap();

        let lines = flatten(&main).unwrap();
        let keywords: Vec<&str> = lines
            .iter()
            .map(|(_, _, raw)| raw.split_whitespace().next().unwrap_or(""))
            .collect();
        assert_eq!(keywords, vec!["MODEL", "HEADER", "PROMPT"]);
    }

    #[test]
    fn test_flatten_detects_cycle() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.conv");
        let b = dir.path().join("b.conv");
        fs::write(&a, "INCLUDE b.conv\n").unwrap();
        fs::write(&b, "INCLUDE a.conv\n").unwrap();

        let err = flatten(&a).unwrap_err();
        assert!(err.message.contains("cycle"));
    }

    #[test]
    fn test_flatten_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.conv");
        let err = flatten(&missing).unwrap_err();
        assert!(err.message.contains("cannot read"));
    }
}
