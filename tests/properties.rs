mod common;

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use common::{class, course, locked, room, trainer};
use timetable_solver::constraints::TrainerLookup;
use timetable_solver::data::{Day, RoomType, SchedulerInput, SchedulerResult};
use timetable_solver::lessons::{
    compute_difficulty_scores, generate_lesson_instances, sort_by_difficulty,
};
use timetable_solver::matrix::AvailabilityMatrix;
use timetable_solver::optimizer::optimize;
use timetable_solver::placement::{SearchSpace, place_lessons};
use timetable_solver::solver::build_class_course_mappings;
use timetable_solver::{SchedulerConfigOverrides, SoftConstraintWeights, solve};

const TRADES: [&str; 2] = ["Welding", "Plumbing"];
const ROOM_TYPES: [RoomType; 3] = [RoomType::Classroom, RoomType::Lab, RoomType::Workshop];

prop_compose! {
    fn arb_input()(
        classes in prop::collection::vec((0..2usize, 1..=2u32, 5..30u32), 1..4),
        courses in prop::collection::vec(
            (0..2usize, 1..=2u32, 0..5u32, 0..3usize, any::<bool>()),
            1..5,
        ),
        trainers in prop::collection::vec((1..20u32, 1..6u32, 1..4usize), 1..3),
        rooms in prop::collection::vec((0..3usize, 5..35u32), 1..4),
        max_periods in 1..=6u32,
        passes in 0..4u32,
        depth in 0..20u32,
    ) -> SchedulerInput {
        SchedulerInput {
            classes: classes
                .iter()
                .enumerate()
                .map(|(i, (trade, level, capacity))| {
                    class(&format!("C{i}"), TRADES[*trade], *level, *capacity)
                })
                .collect(),
            courses: courses
                .iter()
                .enumerate()
                .map(|(i, (trade, level, periods, room_type, double))| {
                    course(
                        &format!("K{i}"),
                        TRADES[*trade],
                        *level,
                        *periods,
                        ROOM_TYPES[*room_type],
                        *double,
                    )
                })
                .collect(),
            trainers: trainers
                .iter()
                .enumerate()
                .map(|(i, (max_weekly, preferred, mask))| {
                    // mask bit 0 = Welding, bit 1 = Plumbing
                    let trades: Vec<&str> = TRADES
                        .iter()
                        .enumerate()
                        .filter(|(bit, _)| *mask & (1usize << *bit) != 0)
                        .map(|(_, t)| *t)
                        .collect();
                    let mut t = trainer(&format!("T{i}"), *max_weekly, &trades);
                    t.preferred_daily_periods = *preferred;
                    t
                })
                .collect(),
            rooms: rooms
                .iter()
                .enumerate()
                .map(|(i, (room_type, capacity))| {
                    room(&format!("R{i}"), ROOM_TYPES[*room_type], *capacity)
                })
                .collect(),
            max_periods,
            config: Some(SchedulerConfigOverrides {
                max_backtrack_depth: Some(depth),
                optimization_passes: Some(passes),
                ..Default::default()
            }),
            locked_assignments: Vec::new(),
        }
    }
}

fn check_invariants(
    input: &SchedulerInput,
    result: &SchedulerResult,
) -> Result<(), TestCaseError> {
    let rooms: HashMap<&str, _> = input.rooms.iter().map(|r| (r.id.as_str(), r)).collect();
    let classes: HashMap<&str, _> = input.classes.iter().map(|c| (c.id.as_str(), c)).collect();
    let courses: HashMap<&str, _> = input.courses.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut trainer_slots = HashSet::new();
    let mut room_slots = HashSet::new();
    let mut class_slots = HashSet::new();
    let mut weekly: HashMap<&str, u32> = HashMap::new();

    for a in &result.assignments {
        for period in a.periods() {
            prop_assert!(period >= 1 && period <= input.max_periods);
            prop_assert!(trainer_slots.insert((a.trainer_id.as_str(), a.day, period)));
            prop_assert!(room_slots.insert((a.room_id.as_str(), a.day, period)));
            prop_assert!(class_slots.insert((a.class_id.as_str(), a.day, period)));
        }
        *weekly.entry(a.trainer_id.as_str()).or_insert(0) += a.period_cost();

        if a.is_locked {
            continue;
        }
        let room = rooms[a.room_id.as_str()];
        let class = classes[a.class_id.as_str()];
        let course = courses[a.course_id.as_str()];
        prop_assert!(room.capacity >= class.capacity);
        prop_assert_eq!(room.room_type, course.required_room_type);
        prop_assert_eq!(a.is_double_period, course.is_double_period);
    }

    for t in &input.trainers {
        prop_assert!(weekly.get(t.id.as_str()).copied().unwrap_or(0) <= t.max_weekly_periods);
    }

    prop_assert_eq!(result.total_lessons, result.placed_lessons + result.failed_lessons);
    prop_assert_eq!(result.placed_lessons, result.assignments.len());
    prop_assert_eq!(result.failed_lessons, result.conflicts.len());
    prop_assert!(result.pass_penalties.windows(2).all(|w| w[1] <= w[0]));
    let sum: u32 = result.assignments.iter().map(|a| a.soft_penalty_score).sum();
    prop_assert_eq!(result.total_penalty, sum);
    Ok(())
}

fn new_matrix(input: &SchedulerInput) -> AvailabilityMatrix {
    AvailabilityMatrix::new(
        input.trainers.iter().map(|t| t.id.as_str()),
        input.rooms.iter().map(|r| r.id.as_str()),
        input.classes.iter().map(|c| c.id.as_str()),
        input.max_periods,
    )
}

proptest! {
    #[test]
    fn prop_result_respects_hard_constraints(input in arb_input()) {
        let result = solve(&input).unwrap();
        check_invariants(&input, &result)?;
    }

    #[test]
    fn prop_locked_assignment_survives(input in arb_input(), day in 0..5usize) {
        let mut input = input;
        let lock = locked(
            "L0",
            &input.classes[0].id,
            "K-locked",
            &input.trainers[0].id,
            &input.rooms[0].id,
            Day::ALL[day],
            1,
        );
        input.locked_assignments = vec![lock.clone()];

        let result = solve(&input).unwrap();
        prop_assert!(result.assignments.contains(&lock));
        prop_assert_eq!(result.assignments.iter().filter(|a| a.is_locked).count(), 1);
        check_invariants(&input, &result)?;
    }

    #[test]
    fn prop_reoptimizing_never_raises_penalty(input in arb_input()) {
        let trainers: TrainerLookup<'_> =
            input.trainers.iter().map(|t| (t.id.as_str(), t)).collect();
        let mappings =
            build_class_course_mappings(&input.classes, &input.courses, &input.trainers, &trainers);
        let mut lessons = generate_lesson_instances(&mappings);
        compute_difficulty_scores(&mut lessons, &input.rooms, &trainers);
        sort_by_difficulty(&mut lessons);

        let weights = SoftConstraintWeights::default();
        let space = SearchSpace {
            rooms: &input.rooms,
            trainers: &trainers,
            max_periods: input.max_periods,
            weights: &weights,
        };
        let mut matrix = new_matrix(&input);
        let placed = place_lessons(&lessons, &space, &mut matrix, Vec::new(), 20);
        let first = optimize(placed.assignments, &lessons, &space, &mut matrix, 3);

        let mut fresh = new_matrix(&input);
        for a in &first.assignments {
            fresh.occupy(a);
        }
        let second = optimize(first.assignments.clone(), &lessons, &space, &mut fresh, 3);
        prop_assert!(second.total_penalty <= first.total_penalty);
    }
}
