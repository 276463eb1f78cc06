//! Greedy best-candidate placement with bounded backtracking.
//!
//! Lessons are visited in the order given (most-constrained-first). Each
//! placed lesson leaves a frame on an explicit choice stack holding its
//! ordered candidate list. When a lesson has no admissible slot, the most
//! recent frame is undone and moved to its next candidate; if that frame is
//! exhausted, both lessons are reported as conflicts.

use log::{debug, trace};

use crate::config::SoftConstraintWeights;
use crate::constraints::{TrainerLookup, admits_at, check_hard_constraints, score_at};
use crate::data::{
    ConflictReport, ConflictType, Day, LessonInstance, Period, RoomInfo, SlotAssignment,
};
use crate::matrix::{AvailabilityMatrix, SlotKey};

/// One admissible `(day, period, room)` for a lesson and its soft penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub day: Day,
    pub period: Period,
    pub room_index: usize,
    pub penalty: u32,
}

/// Read-only inputs shared by placement and optimization.
#[derive(Debug, Clone, Copy)]
pub struct SearchSpace<'a> {
    pub rooms: &'a [RoomInfo],
    pub trainers: &'a TrainerLookup<'a>,
    pub max_periods: u32,
    pub weights: &'a SoftConstraintWeights,
}

impl<'a> SearchSpace<'a> {
    /// Every slot passing the hard constraints, in enumeration order:
    /// days Monday to Friday, periods ascending, rooms in input order.
    pub fn candidates<'p, I>(
        &self,
        lesson: &LessonInstance,
        matrix: &AvailabilityMatrix,
        placed: I,
    ) -> Vec<Candidate>
    where
        I: IntoIterator<Item = &'p SlotAssignment> + Clone,
    {
        let mut candidates = Vec::new();
        let Some(&trainer) = self.trainers.get(lesson.trainer_id.as_str()) else {
            return candidates;
        };
        // grid rows are resolved once per lesson, not per slot
        let keys: Vec<Option<SlotKey>> = self
            .rooms
            .iter()
            .map(|room| matrix.slot_key(&lesson.trainer_id, &room.id, &lesson.class_id))
            .collect();

        for day in Day::ALL {
            for period in 1..=self.max_periods {
                // the soft score does not depend on the room
                let mut penalty = None;
                for (room_index, (room, key)) in self.rooms.iter().zip(&keys).enumerate() {
                    let Some(key) = *key else {
                        continue;
                    };
                    if !admits_at(lesson, trainer, key, day, period, room, matrix, self.max_periods)
                    {
                        continue;
                    }
                    let penalty = *penalty.get_or_insert_with(|| {
                        score_at(
                            lesson,
                            Some(trainer),
                            Some(key.trainer),
                            day,
                            period,
                            matrix,
                            placed.clone(),
                            self.weights,
                        )
                    });
                    candidates.push(Candidate {
                        day,
                        period,
                        room_index,
                        penalty,
                    });
                }
            }
        }
        candidates
    }

    /// Candidates sorted by ascending penalty. Ties keep enumeration order.
    pub fn ranked_candidates<'p, I>(
        &self,
        lesson: &LessonInstance,
        matrix: &AvailabilityMatrix,
        placed: I,
    ) -> Vec<Candidate>
    where
        I: IntoIterator<Item = &'p SlotAssignment> + Clone,
    {
        let mut candidates = self.candidates(lesson, matrix, placed);
        candidates.sort_by_key(|candidate| candidate.penalty);
        candidates
    }

    pub fn admits(
        &self,
        lesson: &LessonInstance,
        day: Day,
        period: Period,
        room: &RoomInfo,
        matrix: &AvailabilityMatrix,
    ) -> bool {
        check_hard_constraints(
            lesson,
            day,
            period,
            room,
            self.trainers,
            matrix,
            self.max_periods,
        )
    }

    /// Builds the assignment for `lesson` at `candidate`. Does not touch the matrix.
    pub fn assignment_for(&self, lesson: &LessonInstance, candidate: Candidate) -> SlotAssignment {
        SlotAssignment {
            lesson_id: lesson.id.clone(),
            class_id: lesson.class_id.clone(),
            course_id: lesson.course_id.clone(),
            trainer_id: lesson.trainer_id.clone(),
            room_id: self.rooms[candidate.room_index].id.clone(),
            day: candidate.day,
            period_number: candidate.period,
            soft_penalty_score: candidate.penalty,
            is_double_period: lesson.is_double_period,
            is_locked: false,
            lock_type: None,
        }
    }
}

#[derive(Debug)]
struct ChoiceFrame {
    lesson_index: usize,
    candidates: Vec<Candidate>,
    choice_index: usize,
    assignment_index: usize,
}

/// Assignments and conflicts produced by the placement phase.
#[derive(Debug, Clone, Default)]
pub struct PlacementOutcome {
    /// Seeded (locked) assignments first, then new placements.
    pub assignments: Vec<SlotAssignment>,
    pub conflicts: Vec<ConflictReport>,
    pub backtracks: u32,
}

/// Places `lessons` in order on top of the already-seeded `assignments`.
///
/// `matrix` must already reflect `assignments`.
pub fn place_lessons(
    lessons: &[LessonInstance],
    space: &SearchSpace<'_>,
    matrix: &mut AvailabilityMatrix,
    assignments: Vec<SlotAssignment>,
    max_backtrack_depth: u32,
) -> PlacementOutcome {
    let mut assignments = assignments;
    let mut conflicts = Vec::new();
    let mut stack: Vec<ChoiceFrame> = Vec::new();
    let mut backtracks = 0;
    let mut i = 0;

    while i < lessons.len() {
        let lesson = &lessons[i];
        let candidates = space.ranked_candidates(lesson, matrix, &assignments);
        trace!("{}: {} candidate slots", lesson.id, candidates.len());

        if let Some(&best) = candidates.first() {
            let assignment = space.assignment_for(lesson, best);
            matrix.occupy(&assignment);
            stack.push(ChoiceFrame {
                lesson_index: i,
                candidates,
                choice_index: 0,
                assignment_index: assignments.len(),
            });
            assignments.push(assignment);
            i += 1;
            continue;
        }

        if backtracks >= max_backtrack_depth {
            trace!("backtrack budget spent, giving up on {}", lesson.id);
            conflicts.push(build_conflict(lesson, space.rooms));
            i += 1;
            continue;
        }

        let Some(mut frame) = stack.pop() else {
            conflicts.push(build_conflict(lesson, space.rooms));
            i += 1;
            continue;
        };
        backtracks += 1;

        let previous = &lessons[frame.lesson_index];
        let undone = assignments.remove(frame.assignment_index);
        matrix.release(&undone);
        debug!(
            "backtrack #{backtracks}: moving {} to make room for {}",
            previous.id, lesson.id
        );

        match next_choice(&mut frame, previous, space, matrix) {
            Some(candidate) => {
                let assignment = space.assignment_for(previous, candidate);
                matrix.occupy(&assignment);
                frame.assignment_index = assignments.len();
                assignments.push(assignment);
                stack.push(frame);
                // retry the same lesson against the new state
            }
            None => {
                debug!("{} exhausted its candidates", previous.id);
                conflicts.push(build_conflict(previous, space.rooms));
                conflicts.push(build_conflict(lesson, space.rooms));
                i += 1;
            }
        }
    }

    PlacementOutcome {
        assignments,
        conflicts,
        backtracks,
    }
}

// advances the frame to its next candidate that still passes the hard constraints
fn next_choice(
    frame: &mut ChoiceFrame,
    lesson: &LessonInstance,
    space: &SearchSpace<'_>,
    matrix: &AvailabilityMatrix,
) -> Option<Candidate> {
    while frame.choice_index + 1 < frame.candidates.len() {
        frame.choice_index += 1;
        let candidate = frame.candidates[frame.choice_index];
        let room = &space.rooms[candidate.room_index];
        if space.admits(lesson, candidate.day, candidate.period, room, matrix) {
            return Some(candidate);
        }
    }
    None
}

/// Classifies why `lesson` could not be placed.
pub fn build_conflict(lesson: &LessonInstance, rooms: &[RoomInfo]) -> ConflictReport {
    let room_fits = rooms.iter().any(|room| {
        room.room_type == lesson.required_room_type && room.capacity >= lesson.class_size
    });

    let (conflict_type, detail) = if !room_fits {
        if lesson.class_size == 0 {
            (
                ConflictType::NoRoom,
                format!("no {} room exists", lesson.required_room_type),
            )
        } else {
            (
                ConflictType::RoomCapacity,
                format!(
                    "no {} room can seat {} students",
                    lesson.required_room_type, lesson.class_size
                ),
            )
        }
    } else if lesson.is_double_period {
        (
            ConflictType::DoublePeriodImpossible,
            "no two consecutive free periods for trainer, room and class".to_string(),
        )
    } else {
        (
            ConflictType::NoValidSlot,
            "no free slot satisfies the hard constraints".to_string(),
        )
    };

    ConflictReport {
        lesson_id: lesson.id.clone(),
        class_id: lesson.class_id.clone(),
        course_id: lesson.course_id.clone(),
        trainer_id: lesson.trainer_id.clone(),
        conflict_type,
        detail,
    }
}
