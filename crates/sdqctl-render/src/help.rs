//! Fixed `HELP` topic table: each topic name expands into a prologue
//! block injected ahead of the first turn only.

use crate::error::RenderError;

const TOPICS: &[(&str, &str)] = &[
    (
        "elide",
        "An ELIDE chain collapses the adjacent PROMPT/RUN/VERIFY/REFCAT \
         steps that follow it into a single agent turn, ending at the \
         first step that can't join the chain.",
    ),
    (
        "branching",
        "A RUN step's ON-FAILURE/ON-SUCCESS block runs its own flat step \
         list depending on the command's exit code. Blocks never nest \
         and never contain ELIDE or another branch.",
    ),
    (
        "checkpoint",
        "CHECKPOINT serializes the executor and session state to the \
         checkpoint directory. Pass CHECKPOINT-PAUSE to also suspend \
         execution until resumed.",
    ),
    (
        "compaction",
        "COMPACT reduces the session's context footprint. Backends with \
         infinite-session support compact natively; otherwise the \
         engine resets the session and reinjects a summary.",
    ),
    (
        "loop-detection",
        "The loop detector aborts a run once the agent's responses stop \
         making forward progress, to avoid burning cycles on a stuck \
         session.",
    ),
];

pub fn expand_topic(name: &str) -> Result<&'static str, RenderError> {
    TOPICS
        .iter()
        .find(|(topic, _)| *topic == name)
        .map(|(_, text)| *text)
        .ok_or_else(|| RenderError::UnknownHelpTopic(name.to_string()))
}
