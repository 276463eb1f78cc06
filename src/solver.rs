use crate::config::SchedulerConfig;
use crate::constraints::TrainerLookup;
use crate::data::{
    ClassInfo, CourseInfo, SchedulerInput, SchedulerResult, SlotAssignment, TrainerInfo,
};
use crate::error::{MAX_PERIODS_LIMIT, ScheduleError};
use crate::lessons::{
    ClassCourseMapping, compute_difficulty_scores, generate_lesson_instances, sort_by_difficulty,
};
use crate::matrix::AvailabilityMatrix;
use crate::optimizer::optimize;
use crate::placement::{SearchSpace, place_lessons};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Instant;

/// Entry point for scheduling runs. Holds the base config that per-run
/// overrides are merged onto.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    base_config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(base_config: SchedulerConfig) -> Self {
        Self { base_config }
    }

    /// Builds a weekly timetable for the input snapshot.
    ///
    /// Unplaceable lessons are returned as conflicts, never as errors.
    ///
    /// # Errors
    ///
    /// Returns error if `max_periods` is out of range or an id is duplicated.
    pub fn solve(&self, input: &SchedulerInput) -> Result<SchedulerResult, ScheduleError> {
        let start_time = Instant::now();
        validate(input)?;

        let config = match &input.config {
            Some(overrides) => self.base_config.merged(overrides),
            None => self.base_config.clone(),
        };
        info!(
            "Scheduling {} classes, {} courses, {} trainers, {} rooms over {} periods/day...",
            input.classes.len(),
            input.courses.len(),
            input.trainers.len(),
            input.rooms.len(),
            input.max_periods
        );

        // lookups
        let trainers: TrainerLookup<'_> =
            input.trainers.iter().map(|t| (t.id.as_str(), t)).collect();
        let mappings =
            build_class_course_mappings(&input.classes, &input.courses, &input.trainers, &trainers);

        // expand, score, sort
        let mut lessons = generate_lesson_instances(&mappings);
        compute_difficulty_scores(&mut lessons, &input.rooms, &trainers);
        sort_by_difficulty(&mut lessons);
        debug!("Generated {} lesson instances", lessons.len());

        let mut matrix = AvailabilityMatrix::new(
            input.trainers.iter().map(|t| t.id.as_str()),
            input.rooms.iter().map(|r| r.id.as_str()),
            input.classes.iter().map(|c| c.id.as_str()),
            input.max_periods,
        );
        let (locked, unlocked): (Vec<SlotAssignment>, Vec<SlotAssignment>) = input
            .locked_assignments
            .iter()
            .cloned()
            .partition(|a| a.is_locked);
        if !unlocked.is_empty() {
            warn!(
                "Ignoring {} entries in lockedAssignments without the locked flag",
                unlocked.len()
            );
        }
        matrix.apply_locked_assignments(&locked);
        let locked_count = locked.len();

        let space = SearchSpace {
            rooms: &input.rooms,
            trainers: &trainers,
            max_periods: input.max_periods,
            weights: &config.weights,
        };

        let placement = place_lessons(
            &lessons,
            &space,
            &mut matrix,
            locked,
            config.max_backtrack_depth,
        );
        debug!(
            "Placement finished: {} placed, {} conflicts, {} backtracks",
            placement.assignments.len(),
            placement.conflicts.len(),
            placement.backtracks
        );

        let optimized = optimize(
            placement.assignments,
            &lessons,
            &space,
            &mut matrix,
            config.optimization_passes,
        );

        let conflicts = placement.conflicts;
        let result = SchedulerResult {
            total_lessons: lessons.len() + locked_count,
            placed_lessons: optimized.assignments.len(),
            failed_lessons: conflicts.len(),
            total_penalty: optimized.total_penalty,
            pass_penalties: optimized.pass_penalties,
            optimization_passes: optimized.passes_run,
            assignments: optimized.assignments,
            conflicts,
        };
        debug_assert_eq!(
            result.total_lessons,
            result.placed_lessons + result.failed_lessons
        );

        info!(
            "Timetable built in {:.2?}: {}/{} lessons placed, {} conflicts, penalty {}",
            start_time.elapsed(),
            result.placed_lessons,
            result.total_lessons,
            result.failed_lessons,
            result.total_penalty
        );
        Ok(result)
    }
}

/// Solves with the default base config.
pub fn solve(input: &SchedulerInput) -> Result<SchedulerResult, ScheduleError> {
    Scheduler::default().solve(input)
}

fn validate(input: &SchedulerInput) -> Result<(), ScheduleError> {
    if input.max_periods == 0 || input.max_periods > MAX_PERIODS_LIMIT {
        return Err(ScheduleError::InvalidMaxPeriods(input.max_periods));
    }
    check_unique("class", input.classes.iter().map(|c| c.id.as_str()))?;
    check_unique("course", input.courses.iter().map(|c| c.id.as_str()))?;
    check_unique("trainer", input.trainers.iter().map(|t| t.id.as_str()))?;
    check_unique("room", input.rooms.iter().map(|r| r.id.as_str()))?;
    check_locks(input)
}

// locks must fit the grid and may not share a trainer, room or class slot
fn check_locks(input: &SchedulerInput) -> Result<(), ScheduleError> {
    let mut taken = HashSet::new();
    for lock in input.locked_assignments.iter().filter(|a| a.is_locked) {
        let invalid = |reason: String| ScheduleError::InvalidLock {
            lesson_id: lock.lesson_id.clone(),
            reason,
        };
        let last = lock.period_number.saturating_add(lock.period_cost() - 1);
        if lock.period_number == 0 || last > input.max_periods {
            return Err(invalid(format!(
                "period {} does not fit in {} periods",
                lock.period_number, input.max_periods
            )));
        }
        for period in lock.periods() {
            let slots = [
                ("trainer", &lock.trainer_id),
                ("room", &lock.room_id),
                ("class", &lock.class_id),
            ];
            for (kind, id) in slots {
                if !taken.insert((kind, id.as_str(), lock.day, period)) {
                    return Err(invalid(format!(
                        "{kind} {id} is already locked on {} period {period}",
                        lock.day
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ScheduleError> {
    match ids.duplicates().next() {
        Some(id) => Err(ScheduleError::DuplicateId {
            kind,
            id: id.to_string(),
        }),
        None => Ok(()),
    }
}

/// Pairs every class with the courses of its trade and level and the
/// trainer who teaches it. Classes with no course or no trainer are dropped.
pub fn build_class_course_mappings<'a>(
    classes: &'a [ClassInfo],
    courses: &'a [CourseInfo],
    trainers: &'a [TrainerInfo],
    lookup: &TrainerLookup<'_>,
) -> Vec<ClassCourseMapping<'a>> {
    let mut mappings = Vec::new();
    for class in classes {
        let matching: Vec<&CourseInfo> = courses
            .iter()
            .filter(|course| course.trade_id == class.trade_id && course.level == class.level)
            .collect();
        if matching.is_empty() {
            warn!(
                "Class {} has no courses for trade {} level {}",
                class.id, class.trade_id, class.level
            );
            continue;
        }
        let Some(trainer_id) = resolve_trainer(class, trainers, lookup) else {
            warn!("Class {} has no trainer for trade {}", class.id, class.trade_id);
            continue;
        };
        mappings.push(ClassCourseMapping {
            class,
            courses: matching,
            trainer_id,
        });
    }
    mappings
}

// pinned trainer if it exists, else the first trainer qualified for the trade
fn resolve_trainer(
    class: &ClassInfo,
    trainers: &[TrainerInfo],
    lookup: &TrainerLookup<'_>,
) -> Option<String> {
    match &class.trainer_id {
        Some(id) => lookup.contains_key(id.as_str()).then(|| id.clone()),
        None => trainers
            .iter()
            .find(|t| t.trade_ids.contains(&class.trade_id))
            .map(|t| t.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ConflictType, Day, RoomInfo, RoomType};

    fn class(id: &str, trade: &str, level: u32) -> ClassInfo {
        ClassInfo {
            id: id.into(),
            name: id.into(),
            trade_id: trade.into(),
            capacity: 15,
            level,
            trainer_id: None,
        }
    }

    fn course(id: &str, trade: &str, level: u32, periods: u32) -> CourseInfo {
        CourseInfo {
            id: id.into(),
            name: id.into(),
            trade_id: trade.into(),
            level,
            periods_per_week: periods,
            required_room_type: RoomType::Classroom,
            is_double_period: false,
        }
    }

    fn trainer(id: &str, trades: &[&str]) -> TrainerInfo {
        TrainerInfo {
            id: id.into(),
            name: id.into(),
            max_weekly_periods: 30,
            preferred_daily_periods: 6,
            trade_ids: trades.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn input() -> SchedulerInput {
        SchedulerInput {
            classes: vec![class("C1", "plumbing", 1)],
            courses: vec![course("K1", "plumbing", 1, 3)],
            trainers: vec![trainer("T1", &["plumbing"])],
            rooms: vec![RoomInfo {
                id: "R1".into(),
                name: "R1".into(),
                building_id: "B1".into(),
                room_type: RoomType::Classroom,
                capacity: 30,
            }],
            max_periods: 6,
            config: None,
            locked_assignments: Vec::new(),
        }
    }

    #[test]
    fn mappings_match_trade_and_level() {
        let classes = [
            class("C1", "plumbing", 1),
            class("C2", "plumbing", 2),
            class("C3", "masonry", 1),
        ];
        let courses = [
            course("K1", "plumbing", 1, 2),
            course("K2", "plumbing", 2, 2),
            course("K3", "plumbing", 1, 1),
        ];
        let trainers = [trainer("T1", &["plumbing"])];
        let lookup: TrainerLookup<'_> = trainers.iter().map(|t| (t.id.as_str(), t)).collect();

        let mappings = build_class_course_mappings(&classes, &courses, &trainers, &lookup);
        assert_eq!(mappings.len(), 2);
        let first: Vec<&str> = mappings[0].courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(first, ["K1", "K3"]);
        assert_eq!(mappings[1].class.id, "C2");
    }

    #[test]
    fn pinned_trainer_wins_and_unknown_pin_drops_the_class() {
        let mut pinned = class("C1", "plumbing", 1);
        pinned.trainer_id = Some("T2".into());
        let mut ghost = class("C2", "plumbing", 1);
        ghost.trainer_id = Some("T9".into());
        let classes = [pinned, ghost];
        let courses = [course("K1", "plumbing", 1, 1)];
        let trainers = [trainer("T1", &["plumbing"]), trainer("T2", &[])];
        let lookup: TrainerLookup<'_> = trainers.iter().map(|t| (t.id.as_str(), t)).collect();

        let mappings = build_class_course_mappings(&classes, &courses, &trainers, &lookup);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].trainer_id, "T2");
    }

    #[test]
    fn solve_places_all_lessons_and_spreads_them() {
        let result = solve(&input()).unwrap();
        assert_eq!(result.total_lessons, 3);
        assert_eq!(result.placed_lessons, 3);
        assert_eq!(result.failed_lessons, 0);
        assert_eq!(result.total_penalty, 0);
        let days: Vec<Day> = result.assignments.iter().map(|a| a.day).unique().collect();
        assert!(days.len() >= 2);
    }

    #[test]
    fn overrides_are_applied() {
        let mut input = input();
        input.config = Some(crate::config::SchedulerConfigOverrides {
            optimization_passes: Some(0),
            ..Default::default()
        });
        let result = solve(&input).unwrap();
        assert_eq!(result.optimization_passes, 0);
        assert!(result.pass_penalties.is_empty());
    }

    #[test]
    fn rejects_bad_max_periods() {
        let mut input = input();
        input.max_periods = 0;
        assert!(matches!(solve(&input), Err(ScheduleError::InvalidMaxPeriods(0))));
        input.max_periods = MAX_PERIODS_LIMIT + 1;
        assert!(matches!(solve(&input), Err(ScheduleError::InvalidMaxPeriods(_))));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut input = input();
        input.rooms.push(input.rooms[0].clone());
        match solve(&input) {
            Err(ScheduleError::DuplicateId { kind, id }) => {
                assert_eq!(kind, "room");
                assert_eq!(id, "R1");
            }
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    fn lock(id: &str, day: Day, period: u32) -> SlotAssignment {
        SlotAssignment {
            lesson_id: id.into(),
            class_id: "C1".into(),
            course_id: "K0".into(),
            trainer_id: "T1".into(),
            room_id: "R1".into(),
            day,
            period_number: period,
            soft_penalty_score: 0,
            is_double_period: false,
            is_locked: true,
            lock_type: None,
        }
    }

    fn lock_error(locks: Vec<SlotAssignment>) -> (String, String) {
        let mut input = input();
        input.max_periods = 2;
        input.locked_assignments = locks;
        match solve(&input) {
            Err(ScheduleError::InvalidLock { lesson_id, reason }) => (lesson_id, reason),
            other => panic!("expected invalid lock error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_locks_outside_the_grid() {
        let (id, reason) = lock_error(vec![lock("X1", Day::Monday, 9)]);
        assert_eq!(id, "X1");
        assert_eq!(reason, "period 9 does not fit in 2 periods");

        let (id, _) = lock_error(vec![lock("X0", Day::Monday, 0)]);
        assert_eq!(id, "X0");

        let (id, _) = lock_error(vec![lock("XM", Day::Monday, u32::MAX)]);
        assert_eq!(id, "XM");

        let mut double = lock("XD", Day::Monday, 2);
        double.is_double_period = true;
        let (id, _) = lock_error(vec![double]);
        assert_eq!(id, "XD");
    }

    #[test]
    fn rejects_overlapping_locks() {
        let (id, reason) =
            lock_error(vec![lock("X2", Day::Tuesday, 1), lock("X3", Day::Tuesday, 1)]);
        assert_eq!(id, "X3");
        assert_eq!(reason, "trainer T1 is already locked on Tuesday period 1");

        // a double period collides on its partner
        let mut double = lock("X4", Day::Friday, 1);
        double.is_double_period = true;
        let mut room_only = lock("X5", Day::Friday, 2);
        room_only.trainer_id = "T2".into();
        room_only.class_id = "C2".into();
        let (id, reason) = lock_error(vec![double, room_only]);
        assert_eq!(id, "X5");
        assert_eq!(reason, "room R1 is already locked on Friday period 2");
    }

    #[test]
    fn valid_locks_are_kept() {
        let mut input = input();
        input.locked_assignments = vec![lock("X1", Day::Monday, 1), lock("X2", Day::Monday, 2)];
        let result = solve(&input).unwrap();
        assert_eq!(result.total_lessons, 5);
        assert!(result.assignments.contains(&input.locked_assignments[1]));
    }

    #[test]
    fn unlocked_entries_in_locked_list_are_ignored() {
        let mut input = input();
        input.locked_assignments.push(SlotAssignment {
            lesson_id: "X".into(),
            class_id: "C1".into(),
            course_id: "K1".into(),
            trainer_id: "T1".into(),
            room_id: "R1".into(),
            day: Day::Monday,
            period_number: 1,
            soft_penalty_score: 0,
            is_double_period: false,
            is_locked: false,
            lock_type: None,
        });
        let result = solve(&input).unwrap();
        assert_eq!(result.total_lessons, 3);
        assert!(result.assignments.iter().all(|a| a.lesson_id != "X"));
    }

    #[test]
    fn room_capacity_conflict_is_reported() {
        let mut input = input();
        input.rooms[0].capacity = 5;
        let result = solve(&input).unwrap();
        assert_eq!(result.placed_lessons, 0);
        assert_eq!(result.failed_lessons, 3);
        assert!(result
            .conflicts
            .iter()
            .all(|c| c.conflict_type == ConflictType::RoomCapacity));
    }
}
