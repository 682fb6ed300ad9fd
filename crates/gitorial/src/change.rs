//! Classifying what changed between two rendered views.

use serde::{Deserialize, Serialize};

/// The parts of a view that decide how much a renderer has to redraw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub step_id: String,
    pub showing_solution: bool,
}

impl ViewSnapshot {
    pub fn new(step_id: impl Into<String>, showing_solution: bool) -> Self {
        Self {
            step_id: step_id.into(),
            showing_solution,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    None,
    StepChange,
    SolutionToggle,
    StepAndSolutionChange,
}

impl ChangeKind {
    pub fn step_changed(&self) -> bool {
        matches!(self, ChangeKind::StepChange | ChangeKind::StepAndSolutionChange)
    }

    pub fn solution_changed(&self) -> bool {
        matches!(
            self,
            ChangeKind::SolutionToggle | ChangeKind::StepAndSolutionChange
        )
    }
}

/// Compare `new` against the previously rendered snapshot.
///
/// Steps are compared by id. With no previous snapshot the result is
/// [`ChangeKind::None`]; a first render is a full render, not a delta.
///
/// # Examples
///
/// ```
/// use gitorial::change::{ChangeKind, ViewSnapshot, detect};
///
/// let shown = ViewSnapshot::new("s1", true);
/// let hidden = ViewSnapshot::new("s1", false);
/// assert_eq!(detect(&hidden, Some(&shown)), ChangeKind::SolutionToggle);
/// assert_eq!(detect(&hidden, None), ChangeKind::None);
/// ```
pub fn detect(new: &ViewSnapshot, old: Option<&ViewSnapshot>) -> ChangeKind {
    let Some(old) = old else {
        return ChangeKind::None;
    };

    let step_changed = new.step_id != old.step_id;
    let solution_changed = new.showing_solution != old.showing_solution;

    match (step_changed, solution_changed) {
        (true, true) => ChangeKind::StepAndSolutionChange,
        (true, false) => ChangeKind::StepChange,
        (false, true) => ChangeKind::SolutionToggle,
        (false, false) => ChangeKind::None,
    }
}
