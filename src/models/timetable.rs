//! Timetable (solution) model.
//!
//! A timetable is the persisted weekly schedule of one class/section: a
//! flat list of entries, each binding a subject and teacher to a
//! (day, period) with its clock times.

use serde::{Deserialize, Serialize};

use super::{ClockTime, Day, TimeWindow};

/// One scheduled period of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    /// Day.
    pub day: Day,
    /// Period number (`Period::index`).
    pub period: u32,
    /// Subject record identifier.
    pub subject_id: String,
    /// Teacher, if any.
    #[serde(default)]
    pub teacher_id: Option<String>,
    /// Start time.
    pub start_time: ClockTime,
    /// End time.
    pub end_time: ClockTime,
    /// Room, if any.
    #[serde(default)]
    pub room: Option<String>,
}

impl TimetableEntry {
    /// Creates an entry without teacher or room.
    pub fn new(
        day: Day,
        period: u32,
        subject_id: impl Into<String>,
        start_time: ClockTime,
        end_time: ClockTime,
    ) -> Self {
        Self {
            day,
            period,
            subject_id: subject_id.into(),
            teacher_id: None,
            start_time,
            end_time,
            room: None,
        }
    }

    /// Sets the teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Sets the room.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// The entry's time window.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// A class/section's persisted timetable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    /// Storage identifier.
    pub id: String,
    /// Owning class.
    pub class_id: String,
    /// Owning section, if the class is split.
    #[serde(default)]
    pub section_id: Option<String>,
    /// Scheduled entries.
    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
}

impl Timetable {
    /// Creates an empty timetable.
    pub fn new(
        id: impl Into<String>,
        class_id: impl Into<String>,
        section_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            class_id: class_id.into(),
            section_id,
            entries: Vec::new(),
        }
    }

    /// Sets the entries.
    pub fn with_entries(mut self, entries: Vec<TimetableEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Whether this timetable belongs to the given class/section.
    pub fn belongs_to(&self, class_id: &str, section_id: Option<&str>) -> bool {
        self.class_id == class_id && self.section_id.as_deref() == section_id
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries scheduled on `day`.
    pub fn entries_for_day(&self, day: Day) -> Vec<&TimetableEntry> {
        self.entries.iter().filter(|e| e.day == day).collect()
    }

    /// Entries taught by `teacher_id`.
    pub fn entries_for_teacher(&self, teacher_id: &str) -> Vec<&TimetableEntry> {
        self.entries
            .iter()
            .filter(|e| e.teacher_id.as_deref() == Some(teacher_id))
            .collect()
    }

    /// Replaces every entry on `day` with `entries`, leaving other days
    /// untouched. Entries are kept sorted by day, then start time.
    pub fn upsert_day(&mut self, day: Day, entries: Vec<TimetableEntry>) {
        self.entries.retain(|e| e.day != day);
        self.entries.extend(entries);
        self.entries
            .sort_by(|a, b| a.day.cmp(&b.day).then(a.start_time.cmp(&b.start_time)));
    }
}
