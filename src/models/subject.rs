//! Subject requirements and normalized subject plans.
//!
//! A [`SubjectRequirement`] is what the caller asks for: "Physics, 4 times a
//! week, as double periods, taught by T-07". Counts may be left unset. After
//! normalization each requirement becomes a [`PlannedSubject`] with concrete
//! counts and an opaque [`SubjectId`] used throughout the search.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PositionRules;

/// Opaque handle to a subject inside one [`SubjectPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(usize);

impl SubjectId {
    /// Creates an id from a plan index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Plan index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Weekly requirement for one subject in one class/section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectRequirement {
    /// Unique key within the class (defaults to `subject_id`).
    pub key: String,
    /// Subject record identifier.
    pub subject_id: String,
    /// Display name.
    pub name: String,
    /// Pre-assigned teacher.
    pub teacher_id: Option<String>,
    /// Occurrences per week. Derived when unset.
    pub weekly_count: Option<u32>,
    /// Occurrences per day. Derived when unset.
    pub max_per_day: Option<u32>,
    /// Placed as double periods where possible.
    pub is_lab: bool,
    /// Only before the morning boundary.
    pub prefer_morning: bool,
    /// Only after the first break.
    pub after_break_only: bool,
    /// Never in the last period of the day.
    pub avoid_last_period: bool,
    /// Room copied into generated entries.
    pub room: Option<String>,
}

impl SubjectRequirement {
    /// Creates a requirement with derived counts and no rules.
    pub fn new(subject_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Pre-assigns a teacher.
    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }

    /// Sets the weekly count.
    pub fn with_weekly_count(mut self, count: u32) -> Self {
        self.weekly_count = Some(count);
        self
    }

    /// Sets the daily cap.
    pub fn with_max_per_day(mut self, count: u32) -> Self {
        self.max_per_day = Some(count);
        self
    }

    /// Marks as lab (double periods).
    pub fn lab(mut self) -> Self {
        self.is_lab = true;
        self
    }

    /// Restricts to morning periods.
    pub fn morning(mut self) -> Self {
        self.prefer_morning = true;
        self
    }

    /// Restricts to periods after the break.
    pub fn after_break(mut self) -> Self {
        self.after_break_only = true;
        self
    }

    /// Keeps out of the last period.
    pub fn not_last(mut self) -> Self {
        self.avoid_last_period = true;
        self
    }

    /// Sets the room.
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Key used for uniqueness: `key`, or `subject_id` when the key is blank.
    pub fn effective_key(&self) -> &str {
        if self.key.trim().is_empty() {
            &self.subject_id
        } else {
            &self.key
        }
    }
}

/// A requirement with resolved counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSubject {
    /// Handle used by tasks and grid slots.
    pub id: SubjectId,
    /// Unique key.
    pub key: String,
    /// Subject record identifier.
    pub subject_id: String,
    /// Display name.
    pub name: String,
    /// Teacher, pre-assigned or auto-assigned.
    pub teacher_id: Option<String>,
    /// Occurrences per week.
    pub weekly_count: u32,
    /// Occurrences per day.
    pub max_per_day: u32,
    /// Double periods.
    pub is_lab: bool,
    /// Morning only.
    pub prefer_morning: bool,
    /// After break only.
    pub after_break_only: bool,
    /// Not in last period.
    pub avoid_last_period: bool,
    /// Room.
    pub room: Option<String>,
}

impl PlannedSubject {
    /// Whether this subject may occupy `position` under the static
    /// (state-independent) placement rules.
    ///
    /// `honor_morning` switches the morning restriction on or off batch-wide.
    pub fn permits(&self, position: usize, rules: &PositionRules, honor_morning: bool) -> bool {
        if self.avoid_last_period && position == rules.last_position {
            return false;
        }
        if honor_morning && self.prefer_morning && position >= rules.morning_boundary {
            return false;
        }
        if self.after_break_only {
            match rules.break_position {
                Some(b) if position > b => {}
                _ => return false,
            }
        }
        true
    }
}

/// Normalized subjects for one class/section, indexed by [`SubjectId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPlan {
    subjects: Vec<PlannedSubject>,
}

impl SubjectPlan {
    /// Wraps planned subjects, renumbering ids to match positions.
    pub fn new(mut subjects: Vec<PlannedSubject>) -> Self {
        for (i, s) in subjects.iter_mut().enumerate() {
            s.id = SubjectId::new(i);
        }
        Self { subjects }
    }

    /// Looks up a subject.
    pub fn get(&self, id: SubjectId) -> Option<&PlannedSubject> {
        self.subjects.get(id.index())
    }

    /// Sets a subject's teacher.
    pub fn set_teacher(&mut self, id: SubjectId, teacher_id: impl Into<String>) {
        if let Some(s) = self.subjects.get_mut(id.index()) {
            s.teacher_id = Some(teacher_id.into());
        }
    }

    /// Finds a subject by key.
    pub fn by_key(&self, key: &str) -> Option<&PlannedSubject> {
        self.subjects.iter().find(|s| s.key == key)
    }

    /// Iterates subjects in plan order.
    pub fn iter(&self) -> impl Iterator<Item = &PlannedSubject> {
        self.subjects.iter()
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Sum of weekly counts.
    pub fn total_weekly(&self) -> u32 {
        self.subjects.iter().map(|s| s.weekly_count).sum()
    }
}
