use serde::Serialize;

/// One compaction event, backend-native or client-side, recorded into
/// the session's stats event list.
#[derive(Debug, Clone, Serialize)]
pub struct CompactionEvent {
    pub tokens_before: u64,
    pub tokens_after: u64,
    pub summary_content: String,
}

impl CompactionEvent {
    pub fn token_delta(&self) -> i64 {
        self.tokens_after as i64 - self.tokens_before as i64
    }

    /// True when compaction actually reduced token usage.
    pub fn effective(&self) -> bool {
        self.token_delta() < 0
    }
}

/// Session-level compaction effectiveness: `sum(after)/sum(before)`.
/// Values > 1 indicate over-preservation (compaction made things worse).
pub fn compaction_effectiveness(events: &[CompactionEvent]) -> Option<f64> {
    if events.is_empty() {
        return None;
    }
    let sum_before: u64 = events.iter().map(|e| e.tokens_before).sum();
    let sum_after: u64 = events.iter().map(|e| e.tokens_after).sum();
    if sum_before == 0 {
        return None;
    }
    Some(sum_after as f64 / sum_before as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_event_has_negative_delta() {
        let event = CompactionEvent {
            tokens_before: 1000,
            tokens_after: 400,
            summary_content: "summary".to_string(),
        };
        assert_eq!(event.token_delta(), -600);
        assert!(event.effective());
    }

    #[test]
    fn test_ineffective_event_has_nonnegative_delta() {
        let event = CompactionEvent {
            tokens_before: 1000,
            tokens_after: 1200,
            summary_content: "summary".to_string(),
        };
        assert!(!event.effective());
    }

    #[test]
    fn test_effectiveness_over_preservation_exceeds_one() {
        let events = vec![CompactionEvent {
            tokens_before: 1000,
            tokens_after: 1500,
            summary_content: String::new(),
        }];
        let effectiveness = compaction_effectiveness(&events).unwrap();
        assert!(effectiveness > 1.0);
    }

    #[test]
    fn test_effectiveness_empty_is_none() {
        assert!(compaction_effectiveness(&[]).is_none());
    }
}
