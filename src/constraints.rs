//! Hard-constraint admissibility and soft-constraint scoring for a candidate
//! `(lesson, day, period, room)`.

use std::collections::{HashMap, HashSet};

use crate::config::SoftConstraintWeights;
use crate::data::{Day, LessonInstance, Period, RoomInfo, SlotAssignment, TrainerInfo};
use crate::matrix::{AvailabilityMatrix, SlotKey};

/// Trainer records keyed by id.
pub type TrainerLookup<'a> = HashMap<&'a str, &'a TrainerInfo>;

/// Returns true if the lesson may legally occupy `room` at `(day, period)`.
///
/// Checks, in order: trainer, room and class free; room large enough; room
/// of the required type; for double periods the partner period exists and is
/// free for all three; the trainer's weekly ceiling is not exceeded.
pub fn check_hard_constraints(
    lesson: &LessonInstance,
    day: Day,
    period: Period,
    room: &RoomInfo,
    trainers: &TrainerLookup<'_>,
    matrix: &AvailabilityMatrix,
    max_periods: u32,
) -> bool {
    let Some(trainer) = trainers.get(lesson.trainer_id.as_str()) else {
        return false;
    };
    let Some(key) = matrix.slot_key(&lesson.trainer_id, &room.id, &lesson.class_id) else {
        return false;
    };
    admits_at(lesson, trainer, key, day, period, room, matrix, max_periods)
}

/// [`check_hard_constraints`] with the trainer record and grid rows already resolved.
#[allow(clippy::too_many_arguments)]
pub(crate) fn admits_at(
    lesson: &LessonInstance,
    trainer: &TrainerInfo,
    key: SlotKey,
    day: Day,
    period: Period,
    room: &RoomInfo,
    matrix: &AvailabilityMatrix,
    max_periods: u32,
) -> bool {
    if !matrix.is_slot_free(key, day, period) {
        return false;
    }
    if room.capacity < lesson.class_size {
        return false;
    }
    if room.room_type != lesson.required_room_type {
        return false;
    }
    if lesson.is_double_period {
        let partner = period.saturating_add(1);
        if partner > max_periods || !matrix.is_slot_free(key, day, partner) {
            return false;
        }
    }
    matrix
        .trainer_weekly_load_at(key.trainer)
        .saturating_add(lesson.period_cost())
        <= trainer.max_weekly_periods
}

/// Additive soft penalty for placing `lesson` at `(day, period)`.
///
/// `placed` is the current assignment set the candidate is judged against.
/// Each rule adds its weight independently, saturating at `u32::MAX`.
/// `building_mismatch` is not scored.
pub fn score_soft_constraints<'a>(
    lesson: &LessonInstance,
    day: Day,
    period: Period,
    trainers: &TrainerLookup<'_>,
    matrix: &AvailabilityMatrix,
    placed: impl IntoIterator<Item = &'a SlotAssignment>,
    weights: &SoftConstraintWeights,
) -> u32 {
    let trainer = trainers.get(lesson.trainer_id.as_str()).copied();
    let row = matrix.trainer_index(&lesson.trainer_id);
    score_at(lesson, trainer, row, day, period, matrix, placed, weights)
}

/// [`score_soft_constraints`] with the trainer record and grid row already resolved.
#[allow(clippy::too_many_arguments)]
pub(crate) fn score_at<'a>(
    lesson: &LessonInstance,
    trainer: Option<&TrainerInfo>,
    row: Option<usize>,
    day: Day,
    period: Period,
    matrix: &AvailabilityMatrix,
    placed: impl IntoIterator<Item = &'a SlotAssignment>,
    weights: &SoftConstraintWeights,
) -> u32 {
    let mut penalty = 0u32;

    if row.is_some_and(|row| matrix.has_trainer_gap_at(row, day, period)) {
        penalty = penalty.saturating_add(weights.trainer_gap);
    }

    let mut same_day = 0u32;
    let mut weekly = 1u32; // counting this placement
    let mut days: HashSet<Day> = HashSet::from([day]);
    for assignment in placed {
        if assignment.class_id != lesson.class_id || assignment.course_id != lesson.course_id {
            continue;
        }
        weekly += 1;
        days.insert(assignment.day);
        if assignment.day == day {
            same_day += 1;
        }
    }

    if same_day >= 2 {
        penalty = penalty.saturating_add(weights.subject_repeat_in_day);
    }

    if let Some(trainer) = trainer {
        let load = row.map_or(0, |row| matrix.trainer_daily_load_at(row, day));
        if load >= trainer.preferred_daily_periods {
            penalty = penalty.saturating_add(weights.trainer_daily_overload);
        }
    }

    if weekly > 2 && days.len() < 2 {
        penalty = penalty.saturating_add(weights.subject_spread);
    }

    penalty
}
