use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ActiveTool {
    pub tool_name: String,
    pub started_at: DateTime<Utc>,
}

/// Table of in-flight tool calls, keyed by the backend's tool-call id.
/// Touched only by the registered event handler, per spec.md §5's
/// shared-resource policy.
#[derive(Debug, Clone, Default)]
pub struct ActiveToolTable {
    entries: HashMap<String, ActiveTool>,
}

impl ActiveToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, tool_call_id: String, tool_name: String, at: DateTime<Utc>) {
        self.entries.insert(
            tool_call_id,
            ActiveTool {
                tool_name,
                started_at: at,
            },
        );
    }

    /// Complete a tool call, returning its duration if it was tracked.
    pub fn complete(&mut self, tool_call_id: &str, at: DateTime<Utc>) -> Option<(String, u64)> {
        let tool = self.entries.remove(tool_call_id)?;
        let duration_ms = (at - tool.started_at).num_milliseconds().max(0) as u64;
        Some((tool.tool_name, duration_ms))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_complete_roundtrip() {
        let mut table = ActiveToolTable::new();
        let t0 = Utc::now();
        table.start("call-1".to_string(), "grep".to_string(), t0);
        assert_eq!(table.len(), 1);
        let (name, duration_ms) = table
            .complete("call-1", t0 + chrono::Duration::milliseconds(250))
            .unwrap();
        assert_eq!(name, "grep");
        assert_eq!(duration_ms, 250);
        assert!(table.is_empty());
    }

    #[test]
    fn test_complete_unknown_id_returns_none() {
        let mut table = ActiveToolTable::new();
        assert!(table.complete("missing", Utc::now()).is_none());
    }
}
