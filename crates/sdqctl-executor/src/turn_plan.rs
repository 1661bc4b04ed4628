use sdqctl_parser::Step;

/// One unit of work in declared step order: either a group of step
/// indices that collapse into a single rendered turn (mirrors
/// `sdqctl_render::elide::collapse`'s grouping exactly, so the Nth
/// `TurnGroup` here lines up with `prompts[N]` in the envelope
/// `render()` produces), or a side-effect step that contributes no
/// turn of its own.
#[derive(Debug, PartialEq, Eq)]
pub enum Unit {
    TurnGroup(Vec<usize>),
    SideEffect(usize),
}

/// Partition `steps` into units in declared order. Must stay in lockstep
/// with `collapse()`'s grouping rule: a run of contiguous steps sharing
/// the same `Some(group)` id merges into one unit; everything else is
/// its own unit, classified as a turn or a side effect by its kind.
pub fn plan_units(steps: &[Step]) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        let group = steps[i].elide_group;
        if group.is_none() {
            if steps[i].is_elidable() {
                units.push(Unit::TurnGroup(vec![i]));
            } else {
                units.push(Unit::SideEffect(i));
            }
            i += 1;
            continue;
        }
        let mut indices = Vec::new();
        let mut j = i;
        while j < steps.len() && steps[j].elide_group == group {
            indices.push(j);
            j += 1;
        }
        units.push(Unit::TurnGroup(indices));
        i = j;
    }
    units
}
