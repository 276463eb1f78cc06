//! Heuristic weekly timetable scheduler.
//!
//! Places class/course lessons onto a Monday to Friday period grid of
//! rooms and trainers. Hard rules (no double-booking, room type and size,
//! trainer weekly ceiling, double periods) are never broken; soft rules are
//! scored and minimised by greedy placement with bounded backtracking followed
//! by local-search passes.
//!
//! Lessons that cannot be placed come back as conflicts in the result, not
//! as errors.

pub mod config;
pub mod constraints;
pub mod data;
pub mod error;
pub mod lessons;
pub mod matrix;
pub mod optimizer;
pub mod placement;
pub mod report;
pub mod server;
pub mod solver;

pub use config::{SchedulerConfig, SchedulerConfigOverrides, ServerConfig, SoftConstraintWeights};
pub use error::ScheduleError;
pub use solver::{Scheduler, solve};
