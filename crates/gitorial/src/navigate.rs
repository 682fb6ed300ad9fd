//! Cursor transitions over a [`Tutorial`].
//!
//! `next` and `previous` never stop on a solution (or preserved readme) step;
//! they walk past it to the nearest navigable step. `go_to` jumps directly
//! to any index. Every successful step change clears the solution flag.
//! A refused transition leaves the tutorial untouched.

use serde::Serialize;
use thiserror::Error;

use crate::types::{Cursor, StepType, Tutorial};

/// A state change that took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Moved { from: usize, to: usize },
    SolutionShown { template: usize, solution: usize },
    SolutionHidden { index: usize },
}

/// Why a transition was declined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("already on the last step")]
    AtLastStep,

    #[error("already on the first step")]
    AtFirstStep,

    #[error("step {target} is out of range (tutorial has {len} steps)")]
    OutOfRange { target: usize, len: usize },

    /// Skipping a solution ran off the end of the tutorial.
    #[error("solution step {index} has no navigable step beyond it")]
    DanglingSolution { index: usize },

    #[error("step {index} is a {step_type} step; only template steps have solutions")]
    NotATemplate { index: usize, step_type: StepType },

    #[error("template step {index} has no paired solution")]
    MissingSolution { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Advance to the next navigable step.
pub fn next(tutorial: &mut Tutorial) -> Result<Transition, Refusal> {
    let target = seek(tutorial, Direction::Forward)?;
    Ok(move_to(tutorial, target))
}

/// Go back to the previous navigable step.
pub fn previous(tutorial: &mut Tutorial) -> Result<Transition, Refusal> {
    let target = seek(tutorial, Direction::Backward)?;
    Ok(move_to(tutorial, target))
}

/// Jump straight to `target`, whatever its type.
pub fn go_to(tutorial: &mut Tutorial, target: usize) -> Result<Transition, Refusal> {
    if target >= tutorial.len() {
        return Err(Refusal::OutOfRange {
            target,
            len: tutorial.len(),
        });
    }
    Ok(move_to(tutorial, target))
}

/// Show or hide the solution of the active template step.
///
/// The cursor does not move; the solution is the step right after the
/// template.
pub fn toggle_solution(tutorial: &mut Tutorial, show: bool) -> Result<Transition, Refusal> {
    let index = tutorial.active_step_index();
    let step_type = tutorial.active_step().step_type;

    if step_type != StepType::Template {
        tracing::warn!(index, %step_type, "solution toggle ignored on a non-template step");
        return Err(Refusal::NotATemplate { index, step_type });
    }

    if !show {
        tutorial.set_cursor(Cursor::at(index));
        return Ok(Transition::SolutionHidden { index });
    }

    let Some(solution) = tutorial.solution_for(index).map(|s| s.index) else {
        tracing::warn!(index, "template step has no solution after it");
        return Err(Refusal::MissingSolution { index });
    };

    tutorial.set_cursor(Cursor {
        active_step_index: index,
        showing_solution: true,
    });
    Ok(Transition::SolutionShown {
        template: index,
        solution,
    })
}

/// Whether [`next`] would succeed.
pub fn can_next(tutorial: &Tutorial) -> bool {
    find_target(tutorial, Direction::Forward).is_ok()
}

/// Whether [`previous`] would succeed.
pub fn can_previous(tutorial: &Tutorial) -> bool {
    find_target(tutorial, Direction::Backward).is_ok()
}

fn move_to(tutorial: &mut Tutorial, target: usize) -> Transition {
    let from = tutorial.active_step_index();
    tutorial.set_cursor(Cursor::at(target));
    Transition::Moved { from, to: target }
}

fn seek(tutorial: &Tutorial, direction: Direction) -> Result<usize, Refusal> {
    let result = find_target(tutorial, direction);
    if let Err(Refusal::DanglingSolution { index }) = result {
        tracing::warn!(
            tutorial = tutorial.id(),
            index,
            ?direction,
            "solution step sits at the edge of the tutorial"
        );
    }
    result
}

fn find_target(tutorial: &Tutorial, direction: Direction) -> Result<usize, Refusal> {
    let steps = tutorial.steps();
    let boundary = match direction {
        Direction::Forward => Refusal::AtLastStep,
        Direction::Backward => Refusal::AtFirstStep,
    };

    let mut skipped_solution = None;
    let mut candidate = tutorial.active_step_index();
    loop {
        candidate = match direction {
            Direction::Forward if candidate + 1 < steps.len() => candidate + 1,
            Direction::Backward if candidate > 0 => candidate - 1,
            _ => {
                return Err(match skipped_solution {
                    Some(index) => Refusal::DanglingSolution { index },
                    None => boundary,
                });
            }
        };

        let step_type = steps[candidate].step_type;
        if step_type.is_navigable() {
            return Ok(candidate);
        }
        if step_type == StepType::Solution && skipped_solution.is_none() {
            skipped_solution = Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Step;

    fn tutorial(types: &[StepType]) -> Tutorial {
        let steps = types
            .iter()
            .enumerate()
            .map(|(i, t)| Step::new(format!("c{}", i), *t, format!("step {}", i)))
            .collect();
        Tutorial::new("t", "T", "/tmp/t", steps).unwrap()
    }

    fn standard() -> Tutorial {
        tutorial(&[
            StepType::Section,
            StepType::Template,
            StepType::Solution,
            StepType::Action,
        ])
    }

    // ── next / previous ────────────────────────────────────────────────

    #[test]
    fn test_next_skips_solution() {
        let mut t = standard();
        assert_eq!(next(&mut t), Ok(Transition::Moved { from: 0, to: 1 }));
        assert_eq!(next(&mut t), Ok(Transition::Moved { from: 1, to: 3 }));
        assert_eq!(t.active_step_index(), 3);
    }

    #[test]
    fn test_previous_skips_solution() {
        let mut t = standard();
        go_to(&mut t, 3).unwrap();
        assert_eq!(previous(&mut t), Ok(Transition::Moved { from: 3, to: 1 }));
        assert_eq!(previous(&mut t), Ok(Transition::Moved { from: 1, to: 0 }));
    }

    #[test]
    fn test_previous_at_start_refused() {
        let mut t = standard();
        assert_eq!(previous(&mut t), Err(Refusal::AtFirstStep));
        assert_eq!(t.active_step_index(), 0);
    }

    #[test]
    fn test_next_at_end_refused() {
        let mut t = standard();
        go_to(&mut t, 3).unwrap();
        assert_eq!(next(&mut t), Err(Refusal::AtLastStep));
        assert_eq!(t.active_step_index(), 3);
    }

    #[test]
    fn test_next_trailing_solution_is_dangling() {
        let mut t = tutorial(&[StepType::Section, StepType::Template, StepType::Solution]);
        go_to(&mut t, 1).unwrap();
        toggle_solution(&mut t, true).unwrap();

        assert_eq!(next(&mut t), Err(Refusal::DanglingSolution { index: 2 }));
        assert_eq!(t.active_step_index(), 1);
        // refused transitions leave the flag alone
        assert!(t.is_showing_solution());
    }

    #[test]
    fn test_previous_leading_solution_is_dangling() {
        let mut t = tutorial(&[StepType::Solution, StepType::Action]);
        go_to(&mut t, 1).unwrap();
        assert_eq!(previous(&mut t), Err(Refusal::DanglingSolution { index: 0 }));
        assert_eq!(t.active_step_index(), 1);
    }

    #[test]
    fn test_next_walks_past_consecutive_solutions() {
        let mut t = tutorial(&[
            StepType::Template,
            StepType::Solution,
            StepType::Solution,
            StepType::Action,
        ]);
        assert_eq!(next(&mut t), Ok(Transition::Moved { from: 0, to: 3 }));
    }

    #[test]
    fn test_next_skips_preserved_readme() {
        let mut t = tutorial(&[StepType::Section, StepType::Readme, StepType::Action]);
        assert_eq!(next(&mut t), Ok(Transition::Moved { from: 0, to: 2 }));
        assert_eq!(previous(&mut t), Ok(Transition::Moved { from: 2, to: 0 }));
    }

    #[test]
    fn test_trailing_readme_is_plain_boundary() {
        let mut t = tutorial(&[StepType::Section, StepType::Readme]);
        assert_eq!(next(&mut t), Err(Refusal::AtLastStep));
    }

    #[test]
    fn test_next_clears_solution_flag() {
        let mut t = standard();
        go_to(&mut t, 1).unwrap();
        toggle_solution(&mut t, true).unwrap();
        assert!(t.is_showing_solution());

        next(&mut t).unwrap();
        assert!(!t.is_showing_solution());
    }

    #[test]
    fn test_previous_clears_solution_flag() {
        let mut t = standard();
        go_to(&mut t, 1).unwrap();
        toggle_solution(&mut t, true).unwrap();

        previous(&mut t).unwrap();
        assert!(!t.is_showing_solution());
        assert_eq!(t.active_step_index(), 0);
    }

    #[test]
    fn test_single_step_tutorial() {
        let mut t = tutorial(&[StepType::Section]);
        assert_eq!(next(&mut t), Err(Refusal::AtLastStep));
        assert_eq!(previous(&mut t), Err(Refusal::AtFirstStep));
        assert!(!can_next(&t));
        assert!(!can_previous(&t));
    }

    // ── go_to ──────────────────────────────────────────────────────────

    #[test]
    fn test_go_to_lands_on_solution() {
        let mut t = standard();
        assert_eq!(go_to(&mut t, 2), Ok(Transition::Moved { from: 0, to: 2 }));
        assert_eq!(t.active_step().step_type, StepType::Solution);
    }

    #[test]
    fn test_go_to_out_of_range() {
        let mut t = standard();
        assert_eq!(
            go_to(&mut t, 4),
            Err(Refusal::OutOfRange { target: 4, len: 4 })
        );
        assert_eq!(t.active_step_index(), 0);
    }

    #[test]
    fn test_go_to_same_index_clears_solution() {
        let mut t = standard();
        go_to(&mut t, 1).unwrap();
        toggle_solution(&mut t, true).unwrap();

        assert_eq!(go_to(&mut t, 1), Ok(Transition::Moved { from: 1, to: 1 }));
        assert!(!t.is_showing_solution());
    }

    // ── toggle_solution ────────────────────────────────────────────────

    #[test]
    fn test_toggle_on_template() {
        let mut t = standard();
        go_to(&mut t, 1).unwrap();

        assert_eq!(
            toggle_solution(&mut t, true),
            Ok(Transition::SolutionShown {
                template: 1,
                solution: 2
            })
        );
        assert_eq!(t.active_step_index(), 1);
        assert!(t.is_showing_solution());
        assert_eq!(t.view().content_ref, "c2");

        assert_eq!(
            toggle_solution(&mut t, false),
            Ok(Transition::SolutionHidden { index: 1 })
        );
        assert!(!t.is_showing_solution());
        assert_eq!(t.view().content_ref, "c1");
    }

    #[test]
    fn test_toggle_on_non_template_refused() {
        let mut t = standard();
        assert_eq!(
            toggle_solution(&mut t, true),
            Err(Refusal::NotATemplate {
                index: 0,
                step_type: StepType::Section
            })
        );
        assert!(!t.is_showing_solution());
    }

    #[test]
    fn test_toggle_without_paired_solution() {
        let mut t = tutorial(&[StepType::Section, StepType::Template]);
        go_to(&mut t, 1).unwrap();
        assert_eq!(
            toggle_solution(&mut t, true),
            Err(Refusal::MissingSolution { index: 1 })
        );
        assert!(!t.is_showing_solution());
        assert_eq!(
            toggle_solution(&mut t, false),
            Ok(Transition::SolutionHidden { index: 1 })
        );
    }

    // ── invariants over operation sequences ────────────────────────────

    #[test]
    fn test_index_stays_in_range_and_flag_resets() {
        let mut t = tutorial(&[
            StepType::Section,
            StepType::Template,
            StepType::Solution,
            StepType::Action,
            StepType::Template,
            StepType::Solution,
            StepType::Section,
        ]);

        // A fixed mix of every operation, including ones that get refused.
        let script: &[u8] = b"nnsnpsgnnnpppptssnpgn";
        for (i, op) in script.iter().enumerate() {
            let result = match op {
                b'n' => next(&mut t),
                b'p' => previous(&mut t),
                b'g' => go_to(&mut t, i % 9),
                b's' => toggle_solution(&mut t, true),
                _ => toggle_solution(&mut t, false),
            };
            assert!(t.active_step_index() < t.len());
            if let Ok(Transition::Moved { .. }) = result {
                assert!(!t.is_showing_solution());
            }
            if matches!(op, b'n' | b'p') && result.is_ok() {
                assert_ne!(t.active_step().step_type, StepType::Solution);
            }
        }
    }
}
