//! Compaction controller: three-tier threshold state machine over
//! synced `(used, max)` tokens, plus a client-side fallback path for
//! backends without native infinite-session support.

pub mod controller;
pub mod events;
pub mod thresholds;

pub use controller::{CompactionController, CompactionMode, FallbackAction};
pub use events::{compaction_effectiveness, CompactionEvent};
pub use thresholds::{CompactionDecision, CompactionThresholds};
