//! Human-readable conflict descriptions for the UI layer.
//!
//! Pure formatting: no scheduling logic lives here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::{ConflictReport, ConflictType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A conflict ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedConflict {
    pub icon: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub course_name: String,
    pub class_name: String,
    pub trainer_name: String,
}

/// Id-to-display-name maps for the entities a conflict references.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameLookup {
    #[serde(default)]
    pub course_names: HashMap<String, String>,
    #[serde(default)]
    pub class_names: HashMap<String, String>,
    #[serde(default)]
    pub trainer_names: HashMap<String, String>,
}

fn icon_and_title(conflict_type: ConflictType) -> (&'static str, &'static str) {
    match conflict_type {
        ConflictType::NoRoom => ("door-closed", "No Suitable Room"),
        ConflictType::TrainerOverloaded => ("user-x", "Trainer Overloaded"),
        ConflictType::DoublePeriodImpossible => ("clock", "Double Period Unavailable"),
        ConflictType::RoomCapacity => ("users", "Room Capacity Exceeded"),
        ConflictType::NoValidSlot => ("calendar-x", "No Valid Time Slot"),
    }
}

/// Only a missing slot is an error; everything else is a warning.
pub fn severity(conflict_type: ConflictType) -> Severity {
    match conflict_type {
        ConflictType::NoValidSlot => Severity::Error,
        _ => Severity::Warning,
    }
}

// unknown ids fall back to the raw id
fn name_of(names: &HashMap<String, String>, id: &str) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

pub fn format_conflict(conflict: &ConflictReport, names: &NameLookup) -> FormattedConflict {
    let (icon, title) = icon_and_title(conflict.conflict_type);
    let course_name = name_of(&names.course_names, &conflict.course_id);
    let class_name = name_of(&names.class_names, &conflict.class_id);
    let trainer_name = name_of(&names.trainer_names, &conflict.trainer_id);

    FormattedConflict {
        icon: icon.to_string(),
        title: title.to_string(),
        description: format!(
            "{course_name} for {class_name} ({trainer_name}) could not be scheduled: {}",
            conflict.detail
        ),
        severity: severity(conflict.conflict_type),
        course_name,
        class_name,
        trainer_name,
    }
}

pub fn format_conflicts(
    conflicts: &[ConflictReport],
    names: &NameLookup,
) -> Vec<FormattedConflict> {
    conflicts
        .iter()
        .map(|conflict| format_conflict(conflict, names))
        .collect()
}

/// Tally of conflicts per type.
pub fn summarize_conflicts(conflicts: &[ConflictReport]) -> BTreeMap<ConflictType, usize> {
    let mut summary = BTreeMap::new();
    for conflict in conflicts {
        *summary.entry(conflict.conflict_type).or_insert(0) += 1;
    }
    summary
}
