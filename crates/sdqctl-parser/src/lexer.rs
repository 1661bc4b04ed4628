//! Line classification: comment/blank skipping, directive-keyword
//! extraction, and indentation-based continuation-line merging.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub file: PathBuf,
    pub line_no: u32,
    pub keyword: String,
    pub value: String,
}

/// Tokenize a flattened `(file, line_no, raw_line)` stream (already
/// expanded for `INCLUDE`) into logical directive lines, merging indented
/// continuation lines into the preceding directive's value.
pub fn tokenize(raw_lines: &[(PathBuf, u32, String)]) -> Vec<LogicalLine> {
    let mut logical: Vec<LogicalLine> = Vec::new();

    for (file, line_no, raw) in raw_lines {
        if raw.trim().is_empty() {
            continue;
        }
        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        if indented {
            let content = raw.trim_start();
            if let Some(last) = logical.last_mut() {
                last.value.push('\n');
                last.value.push_str(content);
            }
            // Continuation with no preceding directive is silently
            // dropped; the parser's first pass guarantees a workflow
            // never starts with an indented line in well-formed input,
            // and malformed input here is caught by the absence of any
            // resulting step rather than a misleading diagnostic.
            continue;
        }

        let trimmed = raw.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }

        let (keyword, value) = match trimmed.split_once(char::is_whitespace) {
            Some((k, v)) => (k.to_string(), v.trim_start().to_string()),
            None => (trimmed.trim_end().to_string(), String::new()),
        };

        logical.push(LogicalLine {
            file: file.clone(),
            line_no: *line_no,
            keyword,
            value,
        });
    }

    logical
}

/// Whether `keyword` looks like a well-formed directive token
/// (uppercase letters, digits, and dashes only, starting with a letter).
pub fn is_directive_shaped(keyword: &str) -> bool {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<(PathBuf, u32, String)> {
        text.lines()
            .enumerate()
            .map(|(i, l)| (PathBuf::from("w.conv"), (i + 1) as u32, l.to_string()))
            .collect()
    }

    #[test]
    fn test_basic_directive() {
        let out = tokenize(&lines("MODEL gpt\n"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keyword, "MODEL");
        assert_eq!(out[0].value, "gpt");
    }

    #[test]
    fn test_skips_comment_and_blank() {
        let out = tokenize(&lines("# a comment\n\nMODEL gpt\n"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_continuation_merges_into_previous() {
        let out = tokenize(&lines("PROMPT first line\n  second line\n  third line\n"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, "first line\nsecond line\nthird line");
    }

    #[test]
    fn test_directive_with_no_value() {
        let out = tokenize(&lines("ELIDE\n"));
        assert_eq!(out[0].keyword, "ELIDE");
        assert_eq!(out[0].value, "");
    }

    #[test]
    fn test_is_directive_shaped() {
        assert!(is_directive_shaped("RUN-ON-ERROR"));
        assert!(is_directive_shaped("MODEL"));
        assert!(!is_directive_shaped("model"));
        assert!(!is_directive_shaped("123"));
        assert!(!is_directive_shaped(""));
    }
}
