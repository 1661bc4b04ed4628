//! Elide-group collapsing: adjacent steps sharing an elide id merge into
//! a single PROMPT whose body is their concatenation. RUN/VERIFY output
//! is supplied by the executor once the step has actually run; until
//! then it renders as an empty placeholder (used by the `render`
//! CLI subcommand, which previews a cycle before execution).

use sdqctl_parser::{Step, StepKind};
use std::collections::HashMap;

/// One collapsed unit of the rendered turn sequence: either a standalone
/// step or the merged body of an elide group.
pub struct CollapsedTurn {
    pub raw: String,
    pub elide_group: Option<u32>,
}

/// `step_outputs` maps a step's index in the original sequence to its
/// captured stdout (RUN) or summary (VERIFY); absent entries render as
/// an empty string.
pub fn collapse(steps: &[Step], step_outputs: &HashMap<usize, String>) -> Vec<CollapsedTurn> {
    let mut turns = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        let group = steps[i].elide_group;
        if group.is_none() {
            if let Some(body) = render_step_body(&steps[i], i, step_outputs) {
                turns.push(CollapsedTurn {
                    raw: body,
                    elide_group: None,
                });
            }
            i += 1;
            continue;
        }

        let mut parts = Vec::new();
        let mut j = i;
        while j < steps.len() && steps[j].elide_group == group {
            if let Some(body) = render_step_body(&steps[j], j, step_outputs) {
                parts.push(body);
            }
            j += 1;
        }
        turns.push(CollapsedTurn {
            raw: parts.join("\n\n"),
            elide_group: group,
        });
        i = j;
    }
    turns
}

fn render_step_body(step: &Step, index: usize, step_outputs: &HashMap<usize, String>) -> Option<String> {
    match &step.kind {
        StepKind::Prompt { body } => Some(body.clone()),
        StepKind::Run(_) => Some(step_outputs.get(&index).cloned().unwrap_or_default()),
        StepKind::Verify(_) => Some(step_outputs.get(&index).cloned().unwrap_or_default()),
        StepKind::Refcat { .. } => Some(step_outputs.get(&index).cloned().unwrap_or_default()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdqctl_parser::RunStep;

    #[test]
    fn test_standalone_prompts_stay_separate() {
        let steps = vec![
            Step::simple(StepKind::Prompt { body: "a".to_string() }),
            Step::simple(StepKind::Prompt { body: "b".to_string() }),
        ];
        let turns = collapse(&steps, &HashMap::new());
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn test_elide_group_merges() {
        let steps = vec![
            Step {
                kind: StepKind::Prompt { body: "intro".to_string() },
                elide_group: Some(0),
            },
            Step {
                kind: StepKind::Run(RunStep {
                    command: "echo hi".to_string(),
                    ..Default::default()
                }),
                elide_group: Some(0),
            },
        ];
        let mut outputs = HashMap::new();
        outputs.insert(1, "hi\n".to_string());
        let turns = collapse(&steps, &outputs);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].raw.contains("intro"));
        assert!(turns[0].raw.contains("hi"));
    }

    #[test]
    fn test_non_elidable_step_ends_chain() {
        let steps = vec![
            Step {
                kind: StepKind::Prompt { body: "a".to_string() },
                elide_group: Some(0),
            },
            Step::simple(StepKind::Pause { message: "stop".to_string() }),
        ];
        let turns = collapse(&steps, &HashMap::new());
        // PAUSE renders no turn body of its own (handled by the executor).
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].elide_group, Some(0));
    }
}
