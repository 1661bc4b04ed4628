//! Context block construction: `CONTEXT` and `REFCAT` expansions,
//! concatenated with `## From: path:Lx-Ly (relative to CWD)` attribution
//! and a fenced block with 1-based line-number prefixes.

use crate::error::RenderError;
use sdqctl_core::ValidationMode;
use sdqctl_parser::{Step, StepKind};
use sdqctl_refs::{resolve_refcat_tokens, AliasTable, Excerpt};
use std::path::Path;

pub struct ContextBlockResult {
    pub rendered: String,
    pub files: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

/// Build the concatenated context block for every `CONTEXT` and
/// `REFCAT` step in the workflow, in document order.
pub fn build_context_block(
    steps: &[Step],
    workspace_root: &Path,
    cwd: &Path,
    aliases: &AliasTable,
    validation_mode: ValidationMode,
) -> Result<ContextBlockResult, RenderError> {
    let mut rendered = String::new();
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for step in steps {
        match &step.kind {
            StepKind::Context { path, optional } => {
                let full = workspace_root.join(path);
                match std::fs::read_to_string(&full) {
                    Ok(content) => {
                        append_excerpt(&mut rendered, path, 1, content.lines().count().max(1) as u32, &content);
                        files.push((path.clone(), content));
                    }
                    Err(_) if *optional || validation_mode == ValidationMode::Lenient => {
                        warnings.push(format!("context file '{path}' not found, skipping"));
                    }
                    Err(e) => {
                        return Err(RenderError::MissingContextFile {
                            path: full,
                            source: e,
                        });
                    }
                }
            }
            StepKind::Refcat { refs } => {
                let excerpts: Vec<Excerpt> =
                    resolve_refcat_tokens(refs, workspace_root, cwd, aliases)?;
                for excerpt in excerpts {
                    append_excerpt(
                        &mut rendered,
                        &excerpt.display_path,
                        excerpt.line_start,
                        excerpt.line_end,
                        &excerpt.content,
                    );
                    files.push((excerpt.display_path.clone(), excerpt.content.clone()));
                }
            }
            _ => {}
        }
    }

    Ok(ContextBlockResult {
        rendered,
        files,
        warnings,
    })
}

fn append_excerpt(out: &mut String, path: &str, start: u32, end: u32, content: &str) {
    out.push_str(&format!("## From: {path}:L{start}-L{end} (relative to CWD)\n"));
    out.push_str("```\n");
    for (i, line) in content.lines().enumerate() {
        out.push_str(&format!("{:>5} | {line}\n", start as usize + i));
    }
    out.push_str("```\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdqctl_parser::Step;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_context_step_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.md"), "hello\nworld\n").unwrap();
        let steps = vec![Step::simple(StepKind::Context {
            path: "notes.md".to_string(),
            optional: false,
        })];
        let aliases = sdqctl_refs::build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        let result = build_context_block(&steps, dir.path(), dir.path(), &aliases, ValidationMode::Strict).unwrap();
        assert!(result.rendered.contains("## From: notes.md:L1-L2"));
        assert!(result.rendered.contains("1 | hello"));
    }

    #[test]
    fn test_missing_required_context_is_fatal() {
        let dir = TempDir::new().unwrap();
        let steps = vec![Step::simple(StepKind::Context {
            path: "nope.md".to_string(),
            optional: false,
        })];
        let aliases = sdqctl_refs::build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        let err = build_context_block(&steps, dir.path(), dir.path(), &aliases, ValidationMode::Strict)
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingContextFile { .. }));
    }

    #[test]
    fn test_missing_optional_context_warns_only() {
        let dir = TempDir::new().unwrap();
        let steps = vec![Step::simple(StepKind::Context {
            path: "nope.md".to_string(),
            optional: true,
        })];
        let aliases = sdqctl_refs::build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        let result = build_context_block(&steps, dir.path(), dir.path(), &aliases, ValidationMode::Strict).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.rendered.is_empty());
    }

    #[test]
    fn test_missing_required_context_lenient_warns_only() {
        let dir = TempDir::new().unwrap();
        let steps = vec![Step::simple(StepKind::Context {
            path: "nope.md".to_string(),
            optional: false,
        })];
        let aliases = sdqctl_refs::build_alias_table(dir.path(), &HashMap::new(), &HashMap::new()).unwrap();
        let result = build_context_block(&steps, dir.path(), dir.path(), &aliases, ValidationMode::Lenient).unwrap();
        assert_eq!(result.warnings.len(), 1);
    }
}
