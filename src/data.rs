use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SchedulerConfigOverrides;

// Type aliases for clarity
pub type ClassId = String;
pub type CourseId = String;
pub type TrainerId = String;
pub type RoomId = String;
pub type Period = u32;

/// A teaching day. The grid always spans Monday to Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All days in grid order. Candidate enumeration follows this order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Classroom,
    Lab,
    Workshop,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomType::Classroom => "classroom",
            RoomType::Lab => "lab",
            RoomType::Workshop => "workshop",
        };
        f.write_str(name)
    }
}

/// A class (student group) that needs teaching time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub trade_id: String,
    pub capacity: u32,
    pub level: u32,
    /// Pins every lesson of this class to one trainer.
    #[serde(default)]
    pub trainer_id: Option<TrainerId>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerInfo {
    pub id: TrainerId,
    pub name: String,
    pub max_weekly_periods: u32,
    pub preferred_daily_periods: u32,
    #[serde(default)]
    pub trade_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub building_id: String,
    pub room_type: RoomType,
    pub capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub id: CourseId,
    pub name: String,
    pub trade_id: String,
    pub level: u32,
    pub periods_per_week: u32,
    pub required_room_type: RoomType,
    #[serde(default)]
    pub is_double_period: bool,
}

/// One atomic unit of teaching time waiting to be placed.
///
/// Lesson instances only live for the duration of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInstance {
    pub id: String,
    pub class_id: ClassId,
    pub course_id: CourseId,
    pub trainer_id: TrainerId,
    pub required_room_type: RoomType,
    pub is_double_period: bool,
    pub class_size: u32,
    pub trade_id: String,
    pub difficulty_score: u32,
}

impl LessonInstance {
    /// Grid periods consumed by one placement of this lesson.
    pub fn period_cost(&self) -> u32 {
        if self.is_double_period { 2 } else { 1 }
    }
}

/// A placed lesson. Double-period assignments store only the anchor period;
/// `period_number + 1` is occupied implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub lesson_id: String,
    pub class_id: ClassId,
    pub course_id: CourseId,
    pub trainer_id: TrainerId,
    pub room_id: RoomId,
    pub day: Day,
    pub period_number: Period,
    #[serde(default)]
    pub soft_penalty_score: u32,
    #[serde(default)]
    pub is_double_period: bool,
    #[serde(default)]
    pub is_locked: bool,
    /// Free-form tag supplied by the caller, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_type: Option<String>,
}

impl SlotAssignment {
    /// Periods covered by this assignment, anchor first. Stops at `Period::MAX`.
    pub fn periods(&self) -> impl Iterator<Item = Period> {
        let last = self.period_number.saturating_add(self.period_cost() - 1);
        self.period_number..=last
    }

    pub fn period_cost(&self) -> u32 {
        if self.is_double_period { 2 } else { 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    NoRoom,
    TrainerOverloaded,
    DoublePeriodImpossible,
    RoomCapacity,
    NoValidSlot,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictType::NoRoom => "no_room",
            ConflictType::TrainerOverloaded => "trainer_overloaded",
            ConflictType::DoublePeriodImpossible => "double_period_impossible",
            ConflictType::RoomCapacity => "room_capacity",
            ConflictType::NoValidSlot => "no_valid_slot",
        };
        f.write_str(name)
    }
}

/// Describes a lesson the engine could not place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub lesson_id: String,
    pub class_id: ClassId,
    pub course_id: CourseId,
    pub trainer_id: TrainerId,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub detail: String,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.conflict_type, self.detail)
    }
}

/// The complete input snapshot for one scheduling run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerInput {
    pub classes: Vec<ClassInfo>,
    pub courses: Vec<CourseInfo>,
    pub trainers: Vec<TrainerInfo>,
    pub rooms: Vec<RoomInfo>,
    pub max_periods: u32,
    #[serde(default)]
    pub config: Option<SchedulerConfigOverrides>,
    #[serde(default)]
    pub locked_assignments: Vec<SlotAssignment>,
}

/// The final output of the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResult {
    pub assignments: Vec<SlotAssignment>,
    pub conflicts: Vec<ConflictReport>,
    pub total_penalty: u32,
    pub total_lessons: usize,
    pub placed_lessons: usize,
    pub failed_lessons: usize,
    /// Global penalty after each optimizer pass that ran.
    pub pass_penalties: Vec<u32>,
    pub optimization_passes: u32,
}
