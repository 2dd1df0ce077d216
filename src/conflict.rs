//! Conflict check for manual edits.
//!
//! Compares proposed entries for one class/section against every other
//! persisted timetable and reports teacher or room double-bookings. The
//! result is advisory: a [`ConflictReport`] is returned, never an error.
//!
//! # Scope
//! Skipped: the timetable named by `exclude_timetable_id` and the timetable
//! of the class/section being edited (its entries are being replaced).
//!
//! # Overlap
//! Same day and overlapping half-open time windows
//! ([`TimeWindow::overlaps`]).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ClockTime, Day, TimeWindow, Timetable};
use crate::store::TimetableStore;

/// An entry the caller intends to save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedEntry {
    /// Day.
    pub day: Day,
    /// Start.
    pub start_time: ClockTime,
    /// End.
    pub end_time: ClockTime,
    /// Subject, informational.
    #[serde(default)]
    pub subject_id: Option<String>,
    /// Teacher.
    #[serde(default)]
    pub teacher_id: Option<String>,
    /// Room.
    #[serde(default)]
    pub room: Option<String>,
}

impl ProposedEntry {
    /// Creates an entry without teacher or room.
    pub fn new(day: Day, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            day,
            start_time,
            end_time,
            subject_id: None,
            teacher_id: None,
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

    /// Time window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

/// Conflict check request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheck {
    /// Class being edited.
    pub class_id: String,
    /// Section being edited.
    #[serde(default)]
    pub section_id: Option<String>,
    /// Proposed entries.
    #[serde(default)]
    pub entries: Vec<ProposedEntry>,
    /// Timetable to leave out of the comparison.
    #[serde(default)]
    pub exclude_timetable_id: Option<String>,
}

/// Resource that is double-booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Same teacher.
    Teacher,
    /// Same room.
    Room,
}

/// One detected conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// Resource kind.
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// Index into the proposed entries.
    pub entry_index: usize,
    /// Day.
    pub day: Day,
    /// Proposed window, `HH:MM-HH:MM`.
    pub time: String,
    /// Class already holding the resource.
    pub conflicting_class: String,
    /// Its section.
    pub conflicting_section: Option<String>,
    /// Human-readable summary.
    pub message: String,
}

/// Result of a conflict check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// Whether any conflict was found.
    pub has_conflicts: bool,
    /// Conflicts, in proposed-entry order.
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    fn from_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }

    /// Conflicts of one kind.
    pub fn of_kind(&self, kind: ConflictKind) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(move |c| c.kind == kind)
    }
}

fn label(class_id: &str, section_id: Option<&str>) -> String {
    match section_id {
        Some(s) => format!("{class_id}/{s}"),
        None => class_id.to_string(),
    }
}

/// Checks proposed entries against persisted timetables.
pub fn check_conflicts(request: &ConflictCheck, timetables: &[Timetable]) -> ConflictReport {
    let section = request.section_id.as_deref();
    let editing = label(&request.class_id, section);
    let others: Vec<&Timetable> = timetables
        .iter()
        .filter(|t| request.exclude_timetable_id.as_deref() != Some(t.id.as_str()))
        .filter(|t| !t.belongs_to(&request.class_id, section))
        .collect();

    let mut conflicts = Vec::new();
    for (entry_index, proposed) in request.entries.iter().enumerate() {
        let window = proposed.window();
        for other in &others {
            let holder = label(&other.class_id, other.section_id.as_deref());
            for existing in other
                .entries
                .iter()
                .filter(|e| e.day == proposed.day && e.window().overlaps(&window))
            {
                let mut push = |kind: ConflictKind, what: String| {
                    conflicts.push(Conflict {
                        kind,
                        entry_index,
                        day: proposed.day,
                        time: window.to_string(),
                        conflicting_class: other.class_id.clone(),
                        conflicting_section: other.section_id.clone(),
                        message: format!(
                            "{what} is booked for {holder} on {} {} while {editing} wants {}",
                            proposed.day,
                            existing.window(),
                            window
                        ),
                    });
                };

                if let (Some(a), Some(b)) = (&proposed.teacher_id, &existing.teacher_id) {
                    if a == b {
                        push(ConflictKind::Teacher, format!("Teacher {a}"));
                    }
                }
                if let (Some(a), Some(b)) = (&proposed.room, &existing.room) {
                    if a == b {
                        push(ConflictKind::Room, format!("Room {a}"));
                    }
                }
            }
        }
    }

    ConflictReport::from_conflicts(conflicts)
}

/// [`check_conflicts`] against everything in `store`.
pub fn check_conflicts_in<S: TimetableStore + ?Sized>(
    request: &ConflictCheck,
    store: &S,
) -> Result<ConflictReport> {
    let timetables = store.timetables()?;
    Ok(check_conflicts(request, &timetables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimetableEntry;
    use crate::store::MemoryStore;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn class_b() -> Timetable {
        Timetable::new("tt-b", "B", None).with_entries(vec![
            TimetableEntry::new(Day::Monday, 2, "PHY", t("09:30"), t("10:15"))
                .with_teacher("T")
                .with_room("R1"),
        ])
    }

    fn request(entries: Vec<ProposedEntry>) -> ConflictCheck {
        ConflictCheck {
            class_id: "A".into(),
            section_id: None,
            entries,
            exclude_timetable_id: None,
        }
    }

    #[test]
    fn test_teacher_overlap_across_classes() {
        let report = check_conflicts(
            &request(vec![
                ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")).with_teacher("T")
            ]),
            &[class_b()],
        );
        assert!(report.has_conflicts);
        assert_eq!(report.conflicts.len(), 1);
        let c = &report.conflicts[0];
        assert_eq!(c.kind, ConflictKind::Teacher);
        assert_eq!(c.entry_index, 0);
        assert_eq!(c.time, "09:00-09:45");
        assert_eq!(c.conflicting_class, "B");
        assert_eq!(
            c.message,
            "Teacher T is booked for B on Monday 09:30-10:15 while A wants 09:00-09:45"
        );
    }

    #[test]
    fn test_touching_windows_do_not_conflict() {
        let report = check_conflicts(
            &request(vec![
                ProposedEntry::new(Day::Monday, t("08:45"), t("09:30")).with_teacher("T")
            ]),
            &[class_b()],
        );
        assert!(!report.has_conflicts);
    }

    #[test]
    fn test_other_day_or_teacher_ignored() {
        let report = check_conflicts(
            &request(vec![
                ProposedEntry::new(Day::Tuesday, t("09:00"), t("09:45")).with_teacher("T"),
                ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")).with_teacher("U"),
                ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")),
            ]),
            &[class_b()],
        );
        assert!(!report.has_conflicts);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_room_conflict() {
        let report = check_conflicts(
            &request(vec![ProposedEntry::new(Day::Monday, t("10:00"), t("10:45"))
                .with_teacher("T")
                .with_room("R1")]),
            &[class_b()],
        );
        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.of_kind(ConflictKind::Room).count(), 1);
        assert_eq!(report.of_kind(ConflictKind::Teacher).count(), 1);
    }

    #[test]
    fn test_excluded_and_own_timetables_skipped() {
        let own = Timetable::new("tt-a", "A", None).with_entries(vec![TimetableEntry::new(
            Day::Monday,
            1,
            "MATH",
            t("09:00"),
            t("09:45"),
        )
        .with_teacher("T")]);
        let proposed =
            vec![ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")).with_teacher("T")];

        let report = check_conflicts(&request(proposed.clone()), &[own.clone()]);
        assert!(!report.has_conflicts);

        let mut req = request(proposed);
        req.exclude_timetable_id = Some("tt-b".into());
        let report = check_conflicts(&req, &[own, class_b()]);
        assert!(!report.has_conflicts);
    }

    #[test]
    fn test_check_against_store() {
        let mut store = MemoryStore::new();
        store.insert(class_b());
        let report = check_conflicts_in(
            &request(vec![
                ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")).with_teacher("T")
            ]),
            &store,
        )
        .unwrap();
        assert!(report.has_conflicts);
    }

    #[test]
    fn test_report_json_shape() {
        let report = check_conflicts(
            &request(vec![
                ProposedEntry::new(Day::Monday, t("09:00"), t("09:45")).with_teacher("T")
            ]),
            &[class_b()],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hasConflicts"], true);
        assert_eq!(json["conflicts"][0]["type"], "teacher");
        assert_eq!(json["conflicts"][0]["conflictingClass"], "B");
        assert_eq!(json["conflicts"][0]["entryIndex"], 0);
    }
}
