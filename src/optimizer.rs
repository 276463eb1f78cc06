//! Local-search refinement of a placed timetable.
//!
//! Each pass walks the unlocked assignments in list order, frees the slot(s)
//! of one assignment, looks at every admissible `(day, period, room)` and
//! moves the assignment if some slot is strictly cheaper than its current
//! score. Otherwise the original slot is re-occupied. Passes stop early once
//! nothing moves.

use std::collections::HashMap;

use log::debug;

use crate::data::{LessonInstance, SlotAssignment};
use crate::matrix::AvailabilityMatrix;
use crate::placement::SearchSpace;

#[derive(Debug, Clone, Default)]
pub struct OptimizationOutcome {
    pub assignments: Vec<SlotAssignment>,
    pub total_penalty: u32,
    /// Global penalty after each pass, in pass order.
    pub pass_penalties: Vec<u32>,
    pub passes_run: u32,
}

/// Sum of every assignment's stored soft penalty, saturating at `u32::MAX`.
pub fn global_penalty(assignments: &[SlotAssignment]) -> u32 {
    assignments
        .iter()
        .fold(0u32, |total, a| total.saturating_add(a.soft_penalty_score))
}

/// Runs up to `passes` improvement passes.
///
/// `matrix` must reflect `assignments` on entry and does again on return.
/// Assignments whose lesson is not in `lessons` are left where they are,
/// as are locked ones.
pub fn optimize(
    assignments: Vec<SlotAssignment>,
    lessons: &[LessonInstance],
    space: &SearchSpace<'_>,
    matrix: &mut AvailabilityMatrix,
    passes: u32,
) -> OptimizationOutcome {
    let mut assignments = assignments;
    let by_id: HashMap<&str, &LessonInstance> =
        lessons.iter().map(|l| (l.id.as_str(), l)).collect();
    let mut pass_penalties = Vec::new();
    let mut passes_run = 0;

    for pass in 1..=passes {
        passes_run = pass;
        let mut moved = 0;

        for i in 0..assignments.len() {
            if assignments[i].is_locked {
                continue;
            }
            let Some(lesson) = by_id.get(assignments[i].lesson_id.as_str()) else {
                continue;
            };

            matrix.release(&assignments[i]);
            let others = assignments
                .iter()
                .enumerate()
                .filter(move |(j, _)| *j != i)
                .map(|(_, a)| a);
            let best = space
                .candidates(lesson, matrix, others)
                .into_iter()
                .min_by_key(|candidate| candidate.penalty);

            match best {
                Some(candidate) if candidate.penalty < assignments[i].soft_penalty_score => {
                    let moved_to = space.assignment_for(lesson, candidate);
                    matrix.occupy(&moved_to);
                    assignments[i] = moved_to;
                    moved += 1;
                }
                _ => matrix.occupy(&assignments[i]),
            }
        }

        let total = global_penalty(&assignments);
        pass_penalties.push(total);
        debug!("optimizer pass {pass}: moved {moved} lessons, global penalty {total}");
        if moved == 0 {
            break;
        }
    }

    OptimizationOutcome {
        total_penalty: global_penalty(&assignments),
        assignments,
        pass_penalties,
        passes_run,
    }
}
