//! Shared file-scanning utility: walks a root respecting a fixed
//! exclusion set plus an optional `.sdqctlignore` file, the same way
//! `ignore::WalkBuilder` layers a custom ignore file over `.gitignore`.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const BUILTIN_EXCLUDES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "node_modules",
    "__pycache__",
    "target",
    ".sdqctl",
];

const IGNORE_FILENAME: &str = ".sdqctlignore";

/// List every file under `root`, honoring `.gitignore`, the builtin
/// exclusion set, and a `.sdqctlignore` file at the workspace root.
pub fn scan_files(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.add_custom_ignore_filename(IGNORE_FILENAME);
    builder.hidden(false);

    let mut out = Vec::new();
    for entry in builder.build().flatten() {
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if is_builtin_excluded(root, path) {
            continue;
        }
        out.push(path.to_path_buf());
    }
    out.sort();
    out
}

fn is_builtin_excluded(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| {
            let s = c.as_os_str().to_string_lossy();
            BUILTIN_EXCLUDES.contains(&s.as_ref())
        })
}
