#![allow(dead_code)]

use timetable_solver::data::{
    ClassInfo, CourseInfo, Day, RoomInfo, RoomType, SchedulerInput, SlotAssignment, TrainerInfo,
};

pub fn class(id: &str, trade: &str, level: u32, capacity: u32) -> ClassInfo {
    ClassInfo {
        id: id.into(),
        name: format!("Class {id}"),
        trade_id: trade.into(),
        capacity,
        level,
        trainer_id: None,
    }
}

pub fn course(
    id: &str,
    trade: &str,
    level: u32,
    periods_per_week: u32,
    room_type: RoomType,
    double: bool,
) -> CourseInfo {
    CourseInfo {
        id: id.into(),
        name: format!("Course {id}"),
        trade_id: trade.into(),
        level,
        periods_per_week,
        required_room_type: room_type,
        is_double_period: double,
    }
}

pub fn trainer(id: &str, max_weekly: u32, trades: &[&str]) -> TrainerInfo {
    TrainerInfo {
        id: id.into(),
        name: format!("Trainer {id}"),
        max_weekly_periods: max_weekly,
        preferred_daily_periods: 6,
        trade_ids: trades.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn room(id: &str, room_type: RoomType, capacity: u32) -> RoomInfo {
    RoomInfo {
        id: id.into(),
        name: format!("Room {id}"),
        building_id: "B1".into(),
        room_type,
        capacity,
    }
}

pub fn locked(
    lesson_id: &str,
    class_id: &str,
    course_id: &str,
    trainer_id: &str,
    room_id: &str,
    day: Day,
    period: u32,
) -> SlotAssignment {
    SlotAssignment {
        lesson_id: lesson_id.into(),
        class_id: class_id.into(),
        course_id: course_id.into(),
        trainer_id: trainer_id.into(),
        room_id: room_id.into(),
        day,
        period_number: period,
        soft_penalty_score: 0,
        is_double_period: false,
        is_locked: true,
        lock_type: Some("manual".into()),
    }
}

/// One welding class, one workshop course, one trainer, one workshop.
pub fn welding_input(room_capacity: u32) -> SchedulerInput {
    SchedulerInput {
        classes: vec![class("C1", "Welding", 1, 20)],
        courses: vec![course("K1", "Welding", 1, 1, RoomType::Workshop, false)],
        trainers: vec![trainer("T1", 10, &["Welding"])],
        rooms: vec![room("R1", RoomType::Workshop, room_capacity)],
        max_periods: 8,
        config: None,
        locked_assignments: Vec::new(),
    }
}
