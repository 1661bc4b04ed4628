use chrono::{DateTime, Utc};
use sdqctl_session::SessionStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Checkpoint schema version; bumped only on a breaking change to the
/// persisted shape, per spec.md §6.
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// Why the executor suspended and wrote this checkpoint. Determines how
/// `resume` behaves: a `Consult` status causes the executor to inject a
/// consultation prompt before the next user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Paused,
    Consult,
    RunFailed,
    VerifyFailed,
    LoopDetected,
    RateLimited,
}

/// Persisted executor state, written atomically to
/// `{checkpoint_dir}/{session_name_or_id}/pause.json`. Unknown keys are
/// ignored on read so older checkpoints stay loadable across minor
/// releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Schema version of this checkpoint's shape; see
    /// [`CHECKPOINT_SCHEMA_VERSION`]. Unknown keys are still ignored on
    /// read regardless of version, per spec.md §6.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub session_name_or_id: String,
    /// Path to the workflow file this checkpoint was written for.
    #[serde(default)]
    pub workflow_path: String,
    /// `SESSION-MODE` in effect when the checkpoint was written, so
    /// resume recreates the same accumulate/compact/fresh behavior.
    #[serde(default)]
    pub session_mode: sdqctl_core::SessionMode,
    pub status: CheckpointStatus,
    pub cycle_index: u32,
    pub step_index: usize,
    pub created_at: DateTime<Utc>,
    /// Set only for `Consult` checkpoints with a `CONSULT-TIMEOUT`
    /// directive active; resuming past this instant is a fatal
    /// `ConsultTimeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consult_expires_at: Option<DateTime<Utc>>,
    pub template_variables: BTreeMap<String, String>,
    /// Accumulated token/quota/tool-timing stats at the moment of
    /// suspension, so a resumed session's stats don't reset to zero.
    #[serde(default)]
    pub stats_snapshot: SessionStats,
    /// Process environment at suspension time, with values for keys
    /// matching the workflow's `MASK-ENV` patterns (or the default
    /// sensitive-name heuristics) replaced before this was ever built,
    /// per spec.md §6's "sensitive env values masked".
    #[serde(default)]
    pub masked_env: BTreeMap<String, String>,
    /// Adapter-specific settings captured at session creation, opaque
    /// to the executor; round-tripped so resume can hand them back to
    /// the same adapter unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_schema_version() -> u32 {
    CHECKPOINT_SCHEMA_VERSION
}

impl Checkpoint {
    pub fn is_consult_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == CheckpointStatus::Consult
            && self.consult_expires_at.is_some_and(|expiry| now > expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(status: CheckpointStatus) -> Checkpoint {
        Checkpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            session_name_or_id: "sess-1".to_string(),
            workflow_path: "w.conv".to_string(),
            session_mode: sdqctl_core::SessionMode::default(),
            status,
            cycle_index: 2,
            step_index: 5,
            created_at: Utc::now(),
            consult_expires_at: None,
            template_variables: BTreeMap::new(),
            stats_snapshot: SessionStats::default(),
            masked_env: BTreeMap::new(),
            adapter_config: None,
            note: None,
        }
    }

    #[test]
    fn test_unexpired_consult_is_not_expired() {
        let mut cp = base(CheckpointStatus::Consult);
        cp.consult_expires_at = Some(Utc::now() + chrono::Duration::hours(1));
        assert!(!cp.is_consult_expired(Utc::now()));
    }

    #[test]
    fn test_expired_consult_is_expired() {
        let mut cp = base(CheckpointStatus::Consult);
        cp.consult_expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        assert!(cp.is_consult_expired(Utc::now()));
    }

    #[test]
    fn test_non_consult_status_never_expires() {
        let cp = base(CheckpointStatus::Paused);
        assert!(!cp.is_consult_expired(Utc::now() + chrono::Duration::days(365)));
    }
}
