use crate::agent::QuotaSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quota warning threshold, below which `quota_warning` reports true.
pub const QUOTA_WARN_BELOW_PERCENT: f64 = 20.0;

/// Accumulated token counts, quota, request rate, and tool timings for
/// one session, synced after every turn. Read by the executor, written
/// only by the registered event handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub turn_count: u32,
    pub request_count: u32,
    pub tokens_used: u64,
    pub max_tokens: u64,
    pub tool_timings: Vec<ToolTiming>,
    pub quota: Option<QuotaSnapshot>,
    #[serde(skip)]
    request_timestamps: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTiming {
    pub tool_name: String,
    pub tool_call_id: String,
    pub duration_ms: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync token counts from the agent's usage channel after a turn
    /// completes, and bump the turn/request counters.
    pub fn record_turn(&mut self, tokens_used: u64, max_tokens: u64, at: DateTime<Utc>) {
        self.turn_count += 1;
        self.request_count += 1;
        self.tokens_used = tokens_used;
        self.max_tokens = max_tokens;
        self.request_timestamps.push(at);
    }

    pub fn record_tool_timing(&mut self, tool_name: String, tool_call_id: String, duration_ms: u64) {
        self.tool_timings.push(ToolTiming {
            tool_name,
            tool_call_id,
            duration_ms,
        });
    }

    pub fn record_quota(&mut self, quota: QuotaSnapshot) {
        self.quota = Some(quota);
    }

    pub fn usage_pct(&self) -> u32 {
        if self.max_tokens == 0 {
            return 0;
        }
        ((self.tokens_used as u128 * 100) / self.max_tokens as u128) as u32
    }

    /// True when the last quota snapshot reported less than
    /// [`QUOTA_WARN_BELOW_PERCENT`] remaining.
    pub fn quota_warning(&self) -> bool {
        self.quota
            .as_ref()
            .and_then(|q| q.remaining_percentage)
            .is_some_and(|pct| pct < QUOTA_WARN_BELOW_PERCENT)
    }

    /// Rolling request rate over the observed timestamps, in requests
    /// per minute.
    pub fn request_rate_per_minute(&self) -> f64 {
        let n = self.request_timestamps.len();
        if n < 2 {
            return 0.0;
        }
        let span = self.request_timestamps[n - 1] - self.request_timestamps[0];
        let minutes = span.num_milliseconds() as f64 / 60_000.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        (n - 1) as f64 / minutes
    }

    /// Predicted remaining requests and minutes until quota exhaustion,
    /// derived from the last quota snapshot and the rolling request rate.
    pub fn predict_remaining(&self) -> Option<(u64, f64)> {
        let quota = self.quota.as_ref()?;
        if quota.is_unlimited_entitlement {
            return None;
        }
        let entitlement = quota.entitlement_requests?;
        let used = quota.used_requests.unwrap_or(0);
        let remaining_requests = entitlement.saturating_sub(used);
        let rate = self.request_rate_per_minute();
        if rate <= 0.0 {
            return Some((remaining_requests, f64::INFINITY));
        }
        Some((remaining_requests, remaining_requests as f64 / rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(remaining_pct: f64) -> QuotaSnapshot {
        QuotaSnapshot {
            remaining_percentage: Some(remaining_pct),
            reset_date: None,
            used_requests: Some(80),
            entitlement_requests: Some(100),
            is_unlimited_entitlement: false,
        }
    }

    #[test]
    fn test_record_turn_updates_counts() {
        let mut stats = SessionStats::new();
        stats.record_turn(500, 1000, Utc::now());
        assert_eq!(stats.turn_count, 1);
        assert_eq!(stats.tokens_used, 500);
        assert_eq!(stats.usage_pct(), 50);
    }

    #[test]
    fn test_quota_warning_below_threshold() {
        let mut stats = SessionStats::new();
        stats.record_quota(quota(15.0));
        assert!(stats.quota_warning());
    }

    #[test]
    fn test_quota_warning_above_threshold() {
        let mut stats = SessionStats::new();
        stats.record_quota(quota(50.0));
        assert!(!stats.quota_warning());
    }

    #[test]
    fn test_unlimited_entitlement_has_no_prediction() {
        let mut stats = SessionStats::new();
        stats.record_quota(QuotaSnapshot {
            remaining_percentage: Some(99.0),
            reset_date: None,
            used_requests: None,
            entitlement_requests: None,
            is_unlimited_entitlement: true,
        });
        assert!(stats.predict_remaining().is_none());
    }

    #[test]
    fn test_predict_remaining_with_known_rate() {
        let mut stats = SessionStats::new();
        let t0 = Utc::now();
        stats.record_turn(10, 100, t0);
        stats.record_turn(20, 100, t0 + chrono::Duration::minutes(1));
        stats.record_quota(quota(20.0));
        let (remaining, minutes) = stats.predict_remaining().unwrap();
        assert_eq!(remaining, 20);
        assert!(minutes > 0.0 && minutes.is_finite());
    }
}
