//! Occupancy grids for trainers, rooms and classes.
//!
//! Every entity gets a dense index when the matrix is built; a cell is
//! addressed as `(entity, day, period)` into one flat `Vec<bool>`. Lookups
//! for unknown ids or out-of-grid periods answer "not available".
//!
//! The id-based methods resolve the index on every call. The search loops
//! resolve a [`SlotKey`] once per lesson and use the `*_at` methods instead.

use std::collections::HashMap;

use log::trace;

use crate::data::{Day, Period, SlotAssignment};

/// Dense grid rows of one trainer, room and class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotKey {
    pub trainer: usize,
    pub room: usize,
    pub class: usize,
}

/// Occupancy of one kind of entity over the week.
#[derive(Debug, Clone)]
struct OccupancyGrid {
    index: HashMap<String, usize>,
    cells: Vec<bool>,
    max_periods: u32,
}

impl OccupancyGrid {
    fn new<'a>(ids: impl IntoIterator<Item = &'a str>, max_periods: u32) -> Self {
        let mut index = HashMap::new();
        for id in ids {
            let next = index.len();
            index.entry(id.to_string()).or_insert(next);
        }
        let cells = vec![false; index.len() * Day::COUNT * max_periods as usize];
        Self {
            index,
            cells,
            max_periods,
        }
    }

    fn entity(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    // periods are 1-indexed; 0 and anything past max_periods have no cell
    fn cell(&self, entity: usize, day: Day, period: Period) -> Option<usize> {
        if period == 0 || period > self.max_periods || entity >= self.index.len() {
            return None;
        }
        let per_day = self.max_periods as usize;
        Some((entity * Day::COUNT + day.index()) * per_day + (period as usize - 1))
    }

    fn is_free_at(&self, entity: usize, day: Day, period: Period) -> bool {
        self.cell(entity, day, period)
            .is_some_and(|offset| !self.cells[offset])
    }

    fn is_free(&self, id: &str, day: Day, period: Period) -> bool {
        self.entity(id)
            .is_some_and(|entity| self.is_free_at(entity, day, period))
    }

    fn set(&mut self, id: &str, day: Day, period: Period, occupied: bool) {
        let offset = self
            .entity(id)
            .and_then(|entity| self.cell(entity, day, period));
        match offset {
            Some(offset) => self.cells[offset] = occupied,
            None => trace!("ignoring occupancy change for {id} at {day} period {period}"),
        }
    }

    fn day_cells_at(&self, entity: usize, day: Day) -> &[bool] {
        if entity >= self.index.len() {
            return &[];
        }
        let per_day = self.max_periods as usize;
        let start = (entity * Day::COUNT + day.index()) * per_day;
        &self.cells[start..start + per_day]
    }
}

/// Tracks which trainers, rooms and classes are busy in each period.
#[derive(Debug, Clone)]
pub struct AvailabilityMatrix {
    trainers: OccupancyGrid,
    rooms: OccupancyGrid,
    classes: OccupancyGrid,
}

impl AvailabilityMatrix {
    pub fn new<'a>(
        trainer_ids: impl IntoIterator<Item = &'a str>,
        room_ids: impl IntoIterator<Item = &'a str>,
        class_ids: impl IntoIterator<Item = &'a str>,
        max_periods: u32,
    ) -> Self {
        Self {
            trainers: OccupancyGrid::new(trainer_ids, max_periods),
            rooms: OccupancyGrid::new(room_ids, max_periods),
            classes: OccupancyGrid::new(class_ids, max_periods),
        }
    }

    pub fn is_trainer_available(&self, trainer_id: &str, day: Day, period: Period) -> bool {
        self.trainers.is_free(trainer_id, day, period)
    }

    pub fn is_room_available(&self, room_id: &str, day: Day, period: Period) -> bool {
        self.rooms.is_free(room_id, day, period)
    }

    pub fn is_class_available(&self, class_id: &str, day: Day, period: Period) -> bool {
        self.classes.is_free(class_id, day, period)
    }

    /// Marks the slot busy for the trainer, room and class together.
    pub fn mark_occupied(
        &mut self,
        trainer_id: &str,
        room_id: &str,
        class_id: &str,
        day: Day,
        period: Period,
    ) {
        self.set_all(trainer_id, room_id, class_id, day, period, true);
    }

    /// Frees the slot for the trainer, room and class together.
    pub fn mark_available(
        &mut self,
        trainer_id: &str,
        room_id: &str,
        class_id: &str,
        day: Day,
        period: Period,
    ) {
        self.set_all(trainer_id, room_id, class_id, day, period, false);
    }

    fn set_all(
        &mut self,
        trainer_id: &str,
        room_id: &str,
        class_id: &str,
        day: Day,
        period: Period,
        occupied: bool,
    ) {
        self.trainers.set(trainer_id, day, period, occupied);
        self.rooms.set(room_id, day, period, occupied);
        self.classes.set(class_id, day, period, occupied);
    }

    /// Occupies every period an assignment covers, including a double-period partner.
    pub fn occupy(&mut self, assignment: &SlotAssignment) {
        for period in assignment.periods() {
            self.mark_occupied(
                &assignment.trainer_id,
                &assignment.room_id,
                &assignment.class_id,
                assignment.day,
                period,
            );
        }
    }

    /// Inverse of [`AvailabilityMatrix::occupy`].
    pub fn release(&mut self, assignment: &SlotAssignment) {
        for period in assignment.periods() {
            self.mark_available(
                &assignment.trainer_id,
                &assignment.room_id,
                &assignment.class_id,
                assignment.day,
                period,
            );
        }
    }

    /// Resolves the grid rows for a trainer, room and class. `None` if any
    /// id is unknown to the matrix.
    pub fn slot_key(&self, trainer_id: &str, room_id: &str, class_id: &str) -> Option<SlotKey> {
        Some(SlotKey {
            trainer: self.trainers.entity(trainer_id)?,
            room: self.rooms.entity(room_id)?,
            class: self.classes.entity(class_id)?,
        })
    }

    pub fn trainer_index(&self, trainer_id: &str) -> Option<usize> {
        self.trainers.entity(trainer_id)
    }

    /// True if the trainer, room and class of `key` are all free.
    pub fn is_slot_free(&self, key: SlotKey, day: Day, period: Period) -> bool {
        self.trainers.is_free_at(key.trainer, day, period)
            && self.rooms.is_free_at(key.room, day, period)
            && self.classes.is_free_at(key.class, day, period)
    }

    pub fn trainer_daily_load(&self, trainer_id: &str, day: Day) -> u32 {
        self.trainer_index(trainer_id)
            .map_or(0, |trainer| self.trainer_daily_load_at(trainer, day))
    }

    pub fn trainer_daily_load_at(&self, trainer: usize, day: Day) -> u32 {
        self.trainers
            .day_cells_at(trainer, day)
            .iter()
            .filter(|busy| **busy)
            .count() as u32
    }

    pub fn trainer_weekly_load(&self, trainer_id: &str) -> u32 {
        self.trainer_index(trainer_id)
            .map_or(0, |trainer| self.trainer_weekly_load_at(trainer))
    }

    pub fn trainer_weekly_load_at(&self, trainer: usize) -> u32 {
        Day::ALL
            .iter()
            .map(|day| self.trainer_daily_load_at(trainer, *day))
            .sum()
    }

    /// True if `period` would sit between an occupied period before it and
    /// an occupied period after it on that day.
    pub fn has_trainer_gap(&self, trainer_id: &str, day: Day, period: Period) -> bool {
        self.trainer_index(trainer_id)
            .is_some_and(|trainer| self.has_trainer_gap_at(trainer, day, period))
    }

    pub fn has_trainer_gap_at(&self, trainer: usize, day: Day, period: Period) -> bool {
        let cells = self.trainers.day_cells_at(trainer, day);
        if period == 0 || period as usize > cells.len() {
            return false;
        }
        let at = period as usize - 1;
        let before = cells[..at].iter().any(|busy| *busy);
        let after = cells[at + 1..].iter().any(|busy| *busy);
        before && after
    }

    /// Seeds occupancy from pre-existing placements. Entries not flagged
    /// as locked are skipped.
    pub fn apply_locked_assignments(&mut self, assignments: &[SlotAssignment]) {
        for assignment in assignments.iter().filter(|a| a.is_locked) {
            self.occupy(assignment);
        }
    }
}
