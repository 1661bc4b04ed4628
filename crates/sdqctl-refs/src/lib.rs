//! Reference resolution: `@path`, `alias:path#Lx-Ly`, and pattern refs,
//! expanded into file excerpts with attribution. Used by both the
//! renderer and the parser's lenient-mode validation pass.

pub mod alias;
pub mod error;
pub mod excerpt;
pub mod spec;

pub use alias::{build_alias_table, AliasTable, RepoEntry, WorkspaceLock};
pub use error::RefError;
pub use excerpt::{resolve, Excerpt};
pub use spec::{is_excluded, parse_ref, RefSpec};

use std::path::Path;

/// Resolve a whole REFCAT token list, dropping excluded (non-reference)
/// tokens silently rather than treating them as unknown aliases.
pub fn resolve_refcat_tokens(
    tokens: &[String],
    workspace_root: &Path,
    cwd: &Path,
    aliases: &AliasTable,
) -> Result<Vec<Excerpt>, RefError> {
    let mut out = Vec::new();
    for token in tokens {
        if is_excluded(token) {
            continue;
        }
        let spec = parse_ref(token)?;
        out.extend(resolve(&spec, workspace_root, cwd, aliases)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_refcat_tokens_skips_exclusions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        let tokens = vec!["@a.txt".to_string(), "user@example.com".to_string()];
        let table = build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        let excerpts = resolve_refcat_tokens(&tokens, dir.path(), dir.path(), &table).unwrap();
        assert_eq!(excerpts.len(), 1);
        assert_eq!(excerpts[0].content, "hello");
    }
}
