use crate::events::{compaction_effectiveness, CompactionEvent};
use crate::thresholds::{CompactionDecision, CompactionThresholds};

/// The path taken to drive compaction, selected once per session at
/// creation time per `INFINITE-SESSIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionMode {
    /// The backend manages compaction itself; the executor only
    /// observes `session.compaction_start`/`session.compaction_complete`.
    BackendNative,
    /// The executor drives compaction directly: request a summary,
    /// optionally reset the session, reinject the summary.
    ClientSideFallback { reset_on_compact: bool },
}

/// Outcome of client-side fallback's decision step, consumed by the
/// cycle executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackAction {
    Skip,
    RequestSummaryKeepSession,
    RequestSummaryAndResetSession,
}

pub struct CompactionController {
    thresholds: CompactionThresholds,
    mode: CompactionMode,
    events: Vec<CompactionEvent>,
}

impl CompactionController {
    pub fn new(thresholds: CompactionThresholds, mode: CompactionMode) -> Self {
        Self {
            thresholds,
            mode,
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> CompactionMode {
        self.mode
    }

    /// What the automatic threshold check should do at this usage %.
    /// Under `BackendNative`, the executor never acts on this itself —
    /// it only informs logging/metrics, since the backend already owns
    /// the decision.
    pub fn decide(&self, used_pct: u32) -> CompactionDecision {
        self.thresholds.decide(used_pct)
    }

    /// Client-side fallback's decision for an explicit `COMPACT`
    /// directive or an automatic threshold crossing.
    pub fn fallback_action(&self, used_pct: u32) -> FallbackAction {
        if !self.thresholds.should_run_explicit_compaction(used_pct) {
            return FallbackAction::Skip;
        }
        match self.mode {
            CompactionMode::BackendNative => FallbackAction::Skip,
            CompactionMode::ClientSideFallback { reset_on_compact: true } => {
                FallbackAction::RequestSummaryAndResetSession
            }
            CompactionMode::ClientSideFallback { reset_on_compact: false } => {
                FallbackAction::RequestSummaryKeepSession
            }
        }
    }

    pub fn record_event(&mut self, event: CompactionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[CompactionEvent] {
        &self.events
    }

    pub fn effectiveness(&self) -> Option<f64> {
        compaction_effectiveness(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_native_never_triggers_client_action() {
        let controller = CompactionController::new(CompactionThresholds::default(), CompactionMode::BackendNative);
        assert_eq!(controller.fallback_action(99), FallbackAction::Skip);
    }

    #[test]
    fn test_client_side_keeps_session_without_reset() {
        let controller = CompactionController::new(
            CompactionThresholds::default(),
            CompactionMode::ClientSideFallback { reset_on_compact: false },
        );
        assert_eq!(
            controller.fallback_action(90),
            FallbackAction::RequestSummaryKeepSession
        );
    }

    #[test]
    fn test_client_side_resets_session_when_configured() {
        let controller = CompactionController::new(
            CompactionThresholds::default(),
            CompactionMode::ClientSideFallback { reset_on_compact: true },
        );
        assert_eq!(
            controller.fallback_action(90),
            FallbackAction::RequestSummaryAndResetSession
        );
    }

    #[test]
    fn test_below_min_always_skips_regardless_of_mode() {
        let controller = CompactionController::new(
            CompactionThresholds::default(),
            CompactionMode::ClientSideFallback { reset_on_compact: true },
        );
        assert_eq!(controller.fallback_action(5), FallbackAction::Skip);
    }

    #[test]
    fn test_effectiveness_tracks_recorded_events() {
        let mut controller = CompactionController::new(CompactionThresholds::default(), CompactionMode::BackendNative);
        controller.record_event(CompactionEvent {
            tokens_before: 1000,
            tokens_after: 300,
            summary_content: "s".to_string(),
        });
        assert!(controller.effectiveness().unwrap() < 1.0);
    }
}
