//! Expands class/course pairings into lesson instances and orders them
//! most-constrained-first.

use itertools::Itertools;

use crate::constraints::TrainerLookup;
use crate::data::{ClassInfo, CourseInfo, LessonInstance, RoomInfo, TrainerId};

// difficulty weights; only the relative ordering they produce matters
const ROOM_TYPE_SCARCITY_WEIGHT: f64 = 40.0;
const TRAINER_CEILING_WEIGHT: f64 = 30.0;
const DOUBLE_PERIOD_BONUS: u32 = 20;
const ROOM_FIT_SCARCITY_WEIGHT: f64 = 30.0;
/// Weekly ceiling at or above which a trainer adds no difficulty.
const TRAINER_CEILING_REFERENCE: f64 = 40.0;

/// A class with the courses it must take and the trainer who teaches them.
#[derive(Debug, Clone)]
pub struct ClassCourseMapping<'a> {
    pub class: &'a ClassInfo,
    pub courses: Vec<&'a CourseInfo>,
    pub trainer_id: TrainerId,
}

/// Expands every mapping into lesson instances.
///
/// A course yields `periods_per_week` instances, or `ceil(periods_per_week / 2)`
/// when taught in double periods. Ids are `class:course:n`, `n` from 1.
pub fn generate_lesson_instances(mappings: &[ClassCourseMapping<'_>]) -> Vec<LessonInstance> {
    mappings
        .iter()
        .flat_map(|mapping| {
            mapping
                .courses
                .iter()
                .flat_map(move |course| lessons_for(mapping, course))
        })
        .collect()
}

fn lessons_for<'a>(
    mapping: &'a ClassCourseMapping<'_>,
    course: &'a CourseInfo,
) -> impl Iterator<Item = LessonInstance> + 'a {
    let count = if course.is_double_period {
        course.periods_per_week.div_ceil(2)
    } else {
        course.periods_per_week
    };
    (1..=count).map(move |n| LessonInstance {
        id: format!("{}:{}:{}", mapping.class.id, course.id, n),
        class_id: mapping.class.id.clone(),
        course_id: course.id.clone(),
        trainer_id: mapping.trainer_id.clone(),
        required_room_type: course.required_room_type,
        is_double_period: course.is_double_period,
        class_size: mapping.class.capacity,
        trade_id: mapping.class.trade_id.clone(),
        difficulty_score: 0,
    })
}

/// Fills in `difficulty_score` for every lesson.
///
/// Scarce room types, low trainer ceilings, double periods and few rooms
/// big enough for the class all push the score up.
pub fn compute_difficulty_scores(
    lessons: &mut [LessonInstance],
    rooms: &[RoomInfo],
    trainers: &TrainerLookup<'_>,
) {
    let total_rooms = rooms.len() as f64;
    let type_counts = rooms.iter().counts_by(|room| room.room_type);

    for lesson in lessons.iter_mut() {
        let matching_type = type_counts
            .get(&lesson.required_room_type)
            .copied()
            .unwrap_or(0);
        let fitting = rooms
            .iter()
            .filter(|room| {
                room.room_type == lesson.required_room_type && room.capacity >= lesson.class_size
            })
            .count();

        let type_term = scarcity(matching_type, total_rooms, ROOM_TYPE_SCARCITY_WEIGHT);
        let fit_term = scarcity(fitting, total_rooms, ROOM_FIT_SCARCITY_WEIGHT);

        let ceiling = trainers
            .get(lesson.trainer_id.as_str())
            .map(|trainer| f64::from(trainer.max_weekly_periods))
            .unwrap_or(0.0)
            .min(TRAINER_CEILING_REFERENCE);
        let trainer_term =
            (TRAINER_CEILING_WEIGHT * (1.0 - ceiling / TRAINER_CEILING_REFERENCE)).round() as u32;

        let double_term = if lesson.is_double_period {
            DOUBLE_PERIOD_BONUS
        } else {
            0
        };

        lesson.difficulty_score = type_term + trainer_term + double_term + fit_term;
    }
}

// share of rooms that do NOT match, scaled to `weight`
fn scarcity(matching: usize, total: f64, weight: f64) -> u32 {
    if total == 0.0 {
        return weight.round() as u32;
    }
    (weight * (1.0 - matching as f64 / total)).round() as u32
}

/// Most-constrained-first. The sort is stable, so ties keep generation order.
pub fn sort_by_difficulty(lessons: &mut [LessonInstance]) {
    lessons.sort_by(|a, b| b.difficulty_score.cmp(&a.difficulty_score));
}
