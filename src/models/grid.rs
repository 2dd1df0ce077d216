//! Weekly period grid.
//!
//! A [`GridTemplate`] fixes the shape of the week: an ordered set of
//! [`Day`]s and an ordered list of [`Period`]s, some of which are breaks.
//! A [`Grid`] is one mutable instance of that shape whose slots receive
//! subject placements during search.
//!
//! # Positions
//! Placement rules work on 0-based *positions* in the period list. The
//! `Period::index` field is the user-facing period number that ends up in
//! timetable entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{ClockTime, SubjectId, SubjectPlan, TimeWindow, TimetableEntry};

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Error parsing a day name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown day '{0}'")]
pub struct ParseDayError(String);

impl Day {
    /// All days in calendar order.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Monday through Friday.
    pub fn weekdays() -> Vec<Day> {
        Self::ALL[..5].to_vec()
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = ParseDayError;

    /// Case-insensitive; accepts full names and three-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| {
                let name = d.as_str().to_ascii_lowercase();
                name == needle || (needle.len() == 3 && name.starts_with(&needle))
            })
            .ok_or_else(|| ParseDayError(s.to_string()))
    }
}

impl TryFrom<String> for Day {
    type Error = ParseDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Day> for String {
    fn from(value: Day) -> Self {
        value.as_str().to_string()
    }
}

/// One teaching period (or break) in the daily bell schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Period number shown to users (usually 1-based).
    pub index: u32,
    /// Start time.
    pub start_time: ClockTime,
    /// End time.
    pub end_time: ClockTime,
    /// Whether this period is a break (never receives a subject).
    #[serde(default)]
    pub is_break: bool,
}

impl Period {
    /// Creates a teaching period.
    pub fn new(index: u32, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            index,
            start_time,
            end_time,
            is_break: false,
        }
    }

    /// Creates a break period.
    pub fn break_period(index: u32, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            is_break: true,
            ..Self::new(index, start_time, end_time)
        }
    }

    /// The period's time window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Positional facts about a template that placement rules consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRules {
    /// Positions strictly below this are "morning".
    pub morning_boundary: usize,
    /// Position of the first break, if any.
    pub break_position: Option<usize>,
    /// Position of the final period of the day.
    pub last_position: usize,
}

/// The shape of a school week: days × periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTemplate {
    /// Teaching days, in order.
    pub days: Vec<Day>,
    /// Daily periods, in order.
    pub periods: Vec<Period>,
}

impl GridTemplate {
    /// Creates a template.
    pub fn new(days: Vec<Day>, periods: Vec<Period>) -> Self {
        Self { days, periods }
    }

    /// Monday-Friday, eight 45-minute slots from 08:00 with a 15-minute
    /// break as period 4.
    pub fn default_week() -> Self {
        let mut minutes = 8 * 60;
        let periods = (1..=8u32)
            .map(|index| {
                let is_break = index == 4;
                let start = minutes;
                minutes += if is_break { 15 } else { 45 };
                Period {
                    index,
                    start_time: ClockTime::from_minutes_wrapping(start),
                    end_time: ClockTime::from_minutes_wrapping(minutes),
                    is_break,
                }
            })
            .collect();
        Self::new(Day::weekdays(), periods)
    }

    /// Number of days.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Number of periods per day, breaks included.
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Non-break periods per day.
    pub fn teaching_periods_per_day(&self) -> usize {
        self.periods.iter().filter(|p| !p.is_break).count()
    }

    /// Non-break slots in the whole week.
    pub fn teaching_slot_count(&self) -> usize {
        self.teaching_periods_per_day() * self.day_count()
    }

    /// Position of the first break period.
    pub fn break_position(&self) -> Option<usize> {
        self.periods.iter().position(|p| p.is_break)
    }

    /// Boundary below which a position counts as morning: the first
    /// break's position, else `ceil(periods / 2)`.
    pub fn morning_boundary(&self) -> usize {
        self.break_position()
            .unwrap_or_else(|| self.period_count().div_ceil(2))
    }

    /// Rules snapshot for the placer.
    pub fn position_rules(&self) -> PositionRules {
        PositionRules {
            morning_boundary: self.morning_boundary(),
            break_position: self.break_position(),
            last_position: self.period_count().saturating_sub(1),
        }
    }

    /// Whether two adjacent teaching periods exist (a double period fits).
    pub fn has_double_slot(&self) -> bool {
        self.periods
            .windows(2)
            .any(|w| !w[0].is_break && !w[1].is_break)
    }

    /// Position of a day in this template.
    pub fn day_position(&self, day: Day) -> Option<usize> {
        self.days.iter().position(|&d| d == day)
    }
}

impl Default for GridTemplate {
    fn default() -> Self {
        Self::default_week()
    }
}

/// What occupies a grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// Placed subject.
    pub subject: SubjectId,
    /// Length of the task this slot belongs to (1 or 2).
    pub length: u8,
    /// Which leg of the task this slot is (0 or 1).
    pub leg: u8,
}

/// One (day, period) cell of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSlot {
    /// Day.
    pub day: Day,
    /// 0-based position in the period list.
    pub position: usize,
    /// Whether the period is a break.
    pub is_break: bool,
    /// Placement, if any.
    pub assigned: Option<SlotAssignment>,
}

/// A week grid under construction.
///
/// Slots are stored day-major: `day_position * periods_per_day + position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    periods_per_day: usize,
    slots: Vec<GridSlot>,
}

impl Grid {
    /// Creates an empty grid shaped like `template`.
    pub fn empty(template: &GridTemplate) -> Self {
        let slots = template
            .days
            .iter()
            .flat_map(|&day| {
                template
                    .periods
                    .iter()
                    .enumerate()
                    .map(move |(position, p)| GridSlot {
                        day,
                        position,
                        is_break: p.is_break,
                        assigned: None,
                    })
            })
            .collect();
        Self {
            periods_per_day: template.period_count(),
            slots,
        }
    }

    fn offset(&self, day_pos: usize, position: usize) -> Option<usize> {
        (position < self.periods_per_day).then(|| day_pos * self.periods_per_day + position)
    }

    /// Slot at (day position, period position).
    pub fn slot(&self, day_pos: usize, position: usize) -> Option<&GridSlot> {
        self.offset(day_pos, position)
            .and_then(|i| self.slots.get(i))
    }

    /// Whether the slot exists, is not a break and is unassigned.
    pub fn is_free(&self, day_pos: usize, position: usize) -> bool {
        self.slot(day_pos, position)
            .is_some_and(|s| !s.is_break && s.assigned.is_none())
    }

    /// Puts a placement into a slot. Returns `false` if the slot is not free.
    pub fn assign(&mut self, day_pos: usize, position: usize, assignment: SlotAssignment) -> bool {
        if !self.is_free(day_pos, position) {
            return false;
        }
        match self.offset(day_pos, position).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) => {
                slot.assigned = Some(assignment);
                true
            }
            None => false,
        }
    }

    /// Empties a slot, returning what was there.
    pub fn clear(&mut self, day_pos: usize, position: usize) -> Option<SlotAssignment> {
        self.offset(day_pos, position)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(|s| s.assigned.take())
    }

    /// All slots, day-major.
    pub fn slots(&self) -> &[GridSlot] {
        &self.slots
    }

    /// Number of occupied slots.
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.assigned.is_some()).count()
    }

    /// Number of slots occupied by `subject`.
    pub fn count_for(&self, subject: SubjectId) -> usize {
        self.slots
            .iter()
            .filter(|s| s.assigned.is_some_and(|a| a.subject == subject))
            .count()
    }

    /// Converts occupied slots into timetable entries, in day/period order.
    pub fn entries(&self, template: &GridTemplate, plan: &SubjectPlan) -> Vec<TimetableEntry> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let assignment = slot.assigned?;
                let period = template.periods.get(slot.position)?;
                let subject = plan.get(assignment.subject)?;
                Some(TimetableEntry {
                    day: slot.day,
                    period: period.index,
                    subject_id: subject.subject_id.clone(),
                    teacher_id: subject.teacher_id.clone(),
                    start_time: period.start_time,
                    end_time: period.end_time,
                    room: subject.room.clone(),
                })
            })
            .collect()
    }
}
