//! Teacher conflict tracker.
//!
//! A passive ledger of which teacher occupies which (day, period) and how
//! many periods each teacher works per day. The placer consults and mutates
//! it; the batch orchestrator clones it per attempt and carries the winning
//! copy forward to the next class.
//!
//! Occupation is keyed by time window, not period number, so timetables
//! built on different bell schedules can share one ledger. The period
//! number is kept for reporting only.
//!
//! # Invariant
//! Every [`mark`](ConflictTracker::mark) made during search is undone by
//! exactly one [`unmark`](ConflictTracker::unmark) on backtrack, so the
//! daily count always equals the number of occupied windows.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Day, Timetable, TimeWindow};

/// One teacher's occupation on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayLoad {
    occupied: BTreeMap<TimeWindow, u32>,
    count: u32,
}

impl DayLoad {
    /// Periods worked.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether a mark carries period number `period`.
    pub fn occupies(&self, period: u32) -> bool {
        self.occupied.values().any(|&p| p == period)
    }

    /// Whether `window` overlaps an occupied window.
    pub fn is_busy(&self, window: &TimeWindow) -> bool {
        self.occupied.keys().any(|w| w.overlaps(window))
    }

    /// Occupied period numbers, in time order.
    pub fn periods(&self) -> impl Iterator<Item = u32> + '_ {
        self.occupied.values().copied()
    }
}

/// Per-teacher, per-day occupation ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictTracker {
    teachers: HashMap<String, HashMap<Day, DayLoad>>,
}

impl ConflictTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker seeded from committed timetables.
    pub fn from_timetables<'a>(timetables: impl IntoIterator<Item = &'a Timetable>) -> Self {
        let mut tracker = Self::new();
        tracker.seed_from(timetables);
        tracker
    }

    /// Lazily creates the ledger for `(teacher, day)`.
    pub fn ensure(&mut self, teacher: &str, day: Day) -> &mut DayLoad {
        self.teachers
            .entry(teacher.to_string())
            .or_default()
            .entry(day)
            .or_default()
    }

    /// Ledger for `(teacher, day)`, if any.
    pub fn day_load(&self, teacher: &str, day: Day) -> Option<&DayLoad> {
        self.teachers.get(teacher).and_then(|days| days.get(&day))
    }

    /// Records that `teacher` works `window` (period number `period`) on `day`.
    ///
    /// Marking an already occupied window leaves the count unchanged.
    pub fn mark(&mut self, teacher: &str, day: Day, period: u32, window: TimeWindow) {
        let load = self.ensure(teacher, day);
        if load.occupied.insert(window, period).is_none() {
            load.count += 1;
        }
    }

    /// Removes a mark. Returns `false` if the window was not occupied.
    pub fn unmark(&mut self, teacher: &str, day: Day, window: &TimeWindow) -> bool {
        let Some(load) = self
            .teachers
            .get_mut(teacher)
            .and_then(|days| days.get_mut(&day))
        else {
            return false;
        };
        if load.occupied.remove(window).is_some() {
            load.count -= 1;
            true
        } else {
            false
        }
    }

    /// Whether `teacher` is busy at any time within `window` on `day`.
    pub fn is_busy(&self, teacher: &str, day: Day, window: &TimeWindow) -> bool {
        self.day_load(teacher, day)
            .is_some_and(|l| l.is_busy(window))
    }

    /// Periods `teacher` works on `day`.
    pub fn day_count(&self, teacher: &str, day: Day) -> u32 {
        self.day_load(teacher, day).map_or(0, DayLoad::count)
    }

    /// Marks every teacher/day/period found in `timetables`.
    ///
    /// Entries without a teacher are ignored.
    pub fn seed_from<'a>(&mut self, timetables: impl IntoIterator<Item = &'a Timetable>) {
        for timetable in timetables {
            for entry in &timetable.entries {
                if let Some(teacher) = &entry.teacher_id {
                    self.mark(teacher, entry.day, entry.period, entry.window());
                }
            }
        }
    }

    /// Removes every mark `timetable` contributed.
    ///
    /// Used when a timetable is about to be regenerated: its own entries must
    /// not block the new placement.
    pub fn release(&mut self, timetable: &Timetable) {
        for entry in &timetable.entries {
            if let Some(teacher) = &entry.teacher_id {
                self.unmark(teacher, entry.day, &entry.window());
            }
        }
    }

    /// Number of teachers with any ledger.
    pub fn teacher_count(&self) -> usize {
        self.teachers.len()
    }

    /// Total occupied (teacher, day, window) triples.
    pub fn total_marked(&self) -> u32 {
        self.teachers
            .values()
            .flat_map(|days| days.values())
            .map(DayLoad::count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClockTime, TimetableEntry};

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn w(start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(t(start), t(end))
    }

    #[test]
    fn test_mark_unmark_pairing() {
        let mut tr = ConflictTracker::new();
        tr.mark("T1", Day::Monday, 1, w("08:00", "08:45"));
        tr.mark("T1", Day::Monday, 2, w("08:45", "09:30"));
        assert_eq!(tr.day_count("T1", Day::Monday), 2);
        assert!(tr.is_busy("T1", Day::Monday, &w("08:00", "08:45")));
        assert!(!tr.is_busy("T1", Day::Tuesday, &w("08:00", "08:45")));
        assert!(!tr.is_busy("T2", Day::Monday, &w("08:00", "08:45")));

        assert!(tr.unmark("T1", Day::Monday, &w("08:00", "08:45")));
        assert!(!tr.unmark("T1", Day::Monday, &w("08:00", "08:45")));
        assert!(!tr.unmark("T9", Day::Monday, &w("08:00", "08:45")));
        assert_eq!(tr.day_count("T1", Day::Monday), 1);
        assert!(!tr.is_busy("T1", Day::Monday, &w("08:00", "08:45")));
    }

    #[test]
    fn test_double_mark_counts_once() {
        let mut tr = ConflictTracker::new();
        tr.mark("T1", Day::Monday, 1, w("08:00", "08:45"));
        tr.mark("T1", Day::Monday, 1, w("08:00", "08:45"));
        assert_eq!(tr.day_count("T1", Day::Monday), 1);
        assert_eq!(tr.total_marked(), 1);
    }

    #[test]
    fn test_overlapping_window_is_busy() {
        let mut tr = ConflictTracker::new();
        // Marked from a timetable with a different bell schedule.
        tr.mark("T1", Day::Monday, 7, w("09:30", "10:15"));
        assert!(tr.is_busy("T1", Day::Monday, &w("09:00", "09:45")));
        assert!(!tr.is_busy("T1", Day::Monday, &w("08:45", "09:30")));
    }

    #[test]
    fn test_same_period_number_other_bell_schedule() {
        let mut tr = ConflictTracker::new();
        // Period 2 of another schedule runs 10:00-10:45.
        tr.mark("T1", Day::Monday, 2, w("10:00", "10:45"));
        assert!(tr.day_load("T1", Day::Monday).unwrap().occupies(2));
        assert!(!tr.is_busy("T1", Day::Monday, &w("08:45", "09:30")));

        // Both period-2 windows are kept and counted.
        tr.mark("T1", Day::Monday, 2, w("08:45", "09:30"));
        assert_eq!(tr.day_count("T1", Day::Monday), 2);
        assert!(tr.unmark("T1", Day::Monday, &w("10:00", "10:45")));
        assert!(tr.is_busy("T1", Day::Monday, &w("08:45", "09:30")));
    }

    #[test]
    fn test_release_removes_only_that_timetable() {
        let old = Timetable::new("a", "C1", None).with_entries(vec![
            TimetableEntry::new(Day::Monday, 1, "MATH", t("08:00"), t("08:45")).with_teacher("T1"),
        ]);
        let other = Timetable::new("b", "C2", None).with_entries(vec![
            TimetableEntry::new(Day::Monday, 2, "PHY", t("08:45"), t("09:30")).with_teacher("T1"),
        ]);
        let mut tr = ConflictTracker::from_timetables([&old, &other]);
        tr.release(&old);
        assert!(!tr.is_busy("T1", Day::Monday, &w("08:00", "08:45")));
        assert!(tr.is_busy("T1", Day::Monday, &w("08:45", "09:30")));
        assert_eq!(tr.total_marked(), 1);
    }

    #[test]
    fn test_clone_isolates_attempts() {
        let mut base = ConflictTracker::new();
        base.mark("T1", Day::Monday, 1, w("08:00", "08:45"));

        let mut attempt = base.clone();
        attempt.mark("T1", Day::Monday, 2, w("08:45", "09:30"));
        attempt.mark("T2", Day::Friday, 5, w("11:00", "11:45"));

        assert_eq!(base.day_count("T1", Day::Monday), 1);
        assert_eq!(base.teacher_count(), 1);
        assert_eq!(attempt.day_count("T1", Day::Monday), 2);
        assert_eq!(attempt.teacher_count(), 2);
    }

    #[test]
    fn test_seed_from_timetables() {
        let a = Timetable::new("a", "C1", None).with_entries(vec![
            TimetableEntry::new(Day::Monday, 1, "MATH", t("08:00"), t("08:45")).with_teacher("T1"),
            TimetableEntry::new(Day::Monday, 2, "ART", t("08:45"), t("09:30")),
        ]);
        let b = Timetable::new("b", "C2", None).with_entries(vec![TimetableEntry::new(
            Day::Tuesday,
            3,
            "PHY",
            t("09:30"),
            t("10:15"),
        )
        .with_teacher("T1")]);

        let tr = ConflictTracker::from_timetables([&a, &b]);
        assert_eq!(tr.total_marked(), 2);
        assert!(tr.day_load("T1", Day::Monday).unwrap().occupies(1));
        assert_eq!(
            tr.day_load("T1", Day::Tuesday).unwrap().periods().collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[test]
    fn test_ensure_is_lazy() {
        let mut tr = ConflictTracker::new();
        assert!(tr.day_load("T1", Day::Monday).is_none());
        assert_eq!(tr.ensure("T1", Day::Monday).count(), 0);
        assert!(tr.day_load("T1", Day::Monday).is_some());
    }
}
