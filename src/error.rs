use thiserror::Error;

/// Largest grid height accepted for one day.
pub const MAX_PERIODS_LIMIT: u32 = 16;

/// Errors for malformed scheduler input or configuration.
///
/// An infeasible timetable is not an error; unplaceable lessons are
/// reported as conflicts in the result.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("maxPeriods must be between 1 and {MAX_PERIODS_LIMIT}, got {0}")]
    InvalidMaxPeriods(u32),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("locked assignment {lesson_id}: {reason}")]
    InvalidLock { lesson_id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
