//! `RefSpec`: the normalized shape of `@path`, `alias:path#Lx-Ly`, and
//! pattern references, plus the exclusion set that keeps ref-shaped
//! prose (emails, URLs, timestamps, placeholders) from being treated
//! as references.

use crate::error::RefError;
use regex::Regex;
use std::sync::LazyLock;

/// A normalized reference, parsed from a single REFCAT token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSpec {
    pub alias: Option<String>,
    pub path: String,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    /// Whether `path` is a glob pattern matching more than one file.
    pub pattern: bool,
    /// Extra lines of context to include before the matched range.
    pub relative_before: u32,
    /// Extra lines of context to include after the matched range.
    pub relative_after: u32,
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.+-]+@[\w-]+\.[\w.-]+$").unwrap());
static URL_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?|ftp|mailto|ssh|git|unix|ws|wss)://?").unwrap());
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$|^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}:\d{2})?Z?$").unwrap()
});
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[<{]\s*\w[\w.\- ]*\s*[>}]$|^\$\{?\w+\}?$").unwrap());

/// A reference-shaped token that is *not* a reference: email addresses,
/// URL schemes, socket paths, timestamps, placeholder tokens, and
/// ellipsis. These are skipped rather than erroring as unknown aliases.
pub fn is_excluded(token: &str) -> bool {
    let t = token.trim();
    if t.is_empty() || t == "..." || t.chars().all(|c| c == '.') {
        return true;
    }
    EMAIL_RE.is_match(t) || URL_SCHEME_RE.is_match(t) || TIMESTAMP_RE.is_match(t) || PLACEHOLDER_RE.is_match(t)
}

/// Parse a single reference token into a `RefSpec`. Callers should check
/// [`is_excluded`] first; this function does not re-check exclusions.
pub fn parse_ref(raw: &str) -> Result<RefSpec, RefError> {
    let trimmed = raw.trim();

    let without_at = trimmed.strip_prefix('@').unwrap_or(trimmed);

    let (before_hash, range_part) = match without_at.split_once('#') {
        Some((p, r)) => (p, Some(r)),
        None => (without_at, None),
    };

    let (alias, path) = split_alias(before_hash);

    let pattern = path.contains('*') || path.contains('?') || path.contains('[');

    let (line_start, line_end) = match range_part {
        None => (None, None),
        Some(r) => parse_line_range(raw, r)?,
    };

    Ok(RefSpec {
        alias,
        path: path.to_string(),
        line_start,
        line_end,
        pattern,
        relative_before: 0,
        relative_after: 0,
    })
}

/// Split `alias:path` where `alias` has no path separators and is not a
/// Windows drive letter (`C:\...`). Returns `(None, whole)` when there is
/// no alias prefix.
fn split_alias(value: &str) -> (Option<String>, &str) {
    if let Some((prefix, rest)) = value.split_once(':') {
        let looks_like_drive_letter = prefix.len() == 1 && prefix.chars().next().unwrap().is_ascii_alphabetic();
        if !prefix.is_empty() && !prefix.contains('/') && !looks_like_drive_letter {
            return (Some(prefix.to_string()), rest);
        }
    }
    (None, value)
}

fn parse_line_range(raw: &str, range: &str) -> Result<(Option<u32>, Option<u32>), RefError> {
    let range = range.strip_prefix('L').unwrap_or(range);
    if let Some((start, end)) = range.split_once('-') {
        let start = start
            .trim_start_matches('L')
            .parse::<u32>()
            .map_err(|_| invalid_range(raw, "start is not an integer"))?;
        let end = end
            .parse::<u32>()
            .map_err(|_| invalid_range(raw, "end is not an integer"))?;
        if end < start {
            return Err(invalid_range(raw, "end precedes start"));
        }
        Ok((Some(start), Some(end)))
    } else {
        let line = range
            .parse::<u32>()
            .map_err(|_| invalid_range(raw, "not an integer"))?;
        Ok((Some(line), Some(line)))
    }
}

fn invalid_range(raw: &str, reason: &str) -> RefError {
    RefError::InvalidLineRange {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}
