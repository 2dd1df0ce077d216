//! Storage collaborator seam.
//!
//! The generator never talks to a database. It reads existing timetables,
//! teachers and class subjects through [`TimetableStore`] and hands finished
//! timetables back to it. [`MemoryStore`] is the in-process implementation
//! used by tests and embedders without a backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Day, SubjectRequirement, Teacher, Timetable, TimetableEntry};
use crate::validation::validate_day_entries;

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other backend failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Persistence operations the generator depends on.
pub trait TimetableStore {
    /// Every persisted timetable in scope.
    fn timetables(&self) -> std::result::Result<Vec<Timetable>, StoreError>;

    /// Teacher pool for auto-assignment.
    fn teachers(&self) -> std::result::Result<Vec<Teacher>, StoreError> {
        Ok(Vec::new())
    }

    /// Subjects configured for a class/section, if the backend knows them.
    fn class_subjects(
        &self,
        _class_id: &str,
        _section_id: Option<&str>,
    ) -> std::result::Result<Option<Vec<SubjectRequirement>>, StoreError> {
        Ok(None)
    }

    /// Creates or replaces the timetable of `timetable`'s class/section.
    ///
    /// Returns the id under which it was stored.
    fn save_timetable(&mut self, timetable: Timetable) -> std::result::Result<String, StoreError>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    timetables: Vec<Timetable>,
    teachers: Vec<Teacher>,
    subjects: Vec<(String, Option<String>, Vec<SubjectRequirement>)>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds teachers to the pool.
    pub fn with_teachers(mut self, teachers: Vec<Teacher>) -> Self {
        self.teachers.extend(teachers);
        self
    }

    /// Registers the subjects of a class/section.
    pub fn with_class_subjects(
        mut self,
        class_id: impl Into<String>,
        section_id: Option<String>,
        subjects: Vec<SubjectRequirement>,
    ) -> Self {
        self.subjects.push((class_id.into(), section_id, subjects));
        self
    }

    /// Inserts a timetable as-is, keeping its id.
    pub fn insert(&mut self, timetable: Timetable) {
        self.timetables.push(timetable);
    }

    /// Timetable of a class/section.
    pub fn find(&self, class_id: &str, section_id: Option<&str>) -> Option<&Timetable> {
        self.timetables
            .iter()
            .find(|t| t.belongs_to(class_id, section_id))
    }

    /// Timetable by id.
    pub fn get(&self, id: &str) -> Option<&Timetable> {
        self.timetables.iter().find(|t| t.id == id)
    }

    /// Number of stored timetables.
    pub fn len(&self) -> usize {
        self.timetables.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.timetables.is_empty()
    }
}

impl TimetableStore for MemoryStore {
    fn timetables(&self) -> std::result::Result<Vec<Timetable>, StoreError> {
        Ok(self.timetables.clone())
    }

    fn teachers(&self) -> std::result::Result<Vec<Teacher>, StoreError> {
        Ok(self.teachers.clone())
    }

    fn class_subjects(
        &self,
        class_id: &str,
        section_id: Option<&str>,
    ) -> std::result::Result<Option<Vec<SubjectRequirement>>, StoreError> {
        Ok(self
            .subjects
            .iter()
            .find(|(c, s, _)| c == class_id && s.as_deref() == section_id)
            .map(|(_, _, subjects)| subjects.clone()))
    }

    fn save_timetable(&mut self, mut timetable: Timetable) -> std::result::Result<String, StoreError> {
        let section = timetable.section_id.clone();
        match self
            .timetables
            .iter_mut()
            .find(|t| t.belongs_to(&timetable.class_id, section.as_deref()))
        {
            Some(existing) => {
                timetable.id = existing.id.clone();
                *existing = timetable;
                Ok(existing.id.clone())
            }
            None => {
                if timetable.id.is_empty() {
                    timetable.id = Uuid::new_v4().to_string();
                }
                let id = timetable.id.clone();
                self.timetables.push(timetable);
                Ok(id)
            }
        }
    }
}

/// Single-day manual edit of one class/section timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayUpsert {
    /// Class.
    pub class_id: String,
    /// Section, if any.
    #[serde(default)]
    pub section_id: Option<String>,
    /// Day being replaced.
    pub day_of_week: Day,
    /// New entries for that day.
    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
}

/// Replaces one day of a class/section timetable, creating the timetable if
/// it does not exist yet. Other days are left untouched.
///
/// # Errors
/// - [`TimetableError::Validation`](crate::TimetableError::Validation) if an
///   entry is for another day, malformed, or overlaps another entry
/// - [`TimetableError::Storage`](crate::TimetableError::Storage) on backend failure
pub fn upsert_day<S: TimetableStore + ?Sized>(store: &mut S, request: &DayUpsert) -> Result<Timetable> {
    validate_day_entries(request.day_of_week, &request.entries)?;

    let section = request.section_id.as_deref();
    let mut timetable = store
        .timetables()?
        .into_iter()
        .find(|t| t.belongs_to(&request.class_id, section))
        .unwrap_or_else(|| Timetable::new("", request.class_id.clone(), request.section_id.clone()));

    timetable.upsert_day(request.day_of_week, request.entries.clone());
    timetable.id = store.save_timetable(timetable.clone())?;

    debug!(
        class = %request.class_id,
        day = %request.day_of_week,
        entries = request.entries.len(),
        "day upserted"
    );
    Ok(timetable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimetableError;
    use crate::models::ClockTime;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn entry(day: Day, period: u32, start: &str, end: &str) -> TimetableEntry {
        TimetableEntry::new(day, period, "MATH", t(start), t(end)).with_teacher("T1")
    }

    #[test]
    fn test_save_assigns_uuid_and_replaces() {
        let mut store = MemoryStore::new();
        let id = store
            .save_timetable(Timetable::new("", "C1", None))
            .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let replaced = store
            .save_timetable(
                Timetable::new("", "C1", None)
                    .with_entries(vec![entry(Day::Monday, 1, "08:00", "08:45")]),
            )
            .unwrap();
        assert_eq!(replaced, id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().entry_count(), 1);

        let other = store
            .save_timetable(Timetable::new("", "C1", Some("B".into())))
            .unwrap();
        assert_ne!(other, id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_class_subjects_lookup() {
        let store = MemoryStore::new().with_class_subjects(
            "C1",
            Some("A".into()),
            vec![SubjectRequirement::new("MATH", "Math")],
        );
        assert_eq!(store.class_subjects("C1", Some("A")).unwrap().unwrap().len(), 1);
        assert!(store.class_subjects("C1", None).unwrap().is_none());
    }

    #[test]
    fn test_upsert_day_creates_then_replaces() {
        let mut store = MemoryStore::new();
        let mut request = DayUpsert {
            class_id: "C1".into(),
            section_id: None,
            day_of_week: Day::Monday,
            entries: vec![
                entry(Day::Monday, 1, "08:00", "08:45"),
                entry(Day::Monday, 2, "08:45", "09:30"),
            ],
        };
        let created = upsert_day(&mut store, &request).unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.entry_count(), 2);

        // Add a Tuesday edit, then replace Monday.
        upsert_day(
            &mut store,
            &DayUpsert {
                day_of_week: Day::Tuesday,
                entries: vec![entry(Day::Tuesday, 1, "08:00", "08:45")],
                ..request.clone()
            },
        )
        .unwrap();
        request.entries = vec![entry(Day::Monday, 3, "09:30", "10:15")];
        let updated = upsert_day(&mut store, &request).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.entries_for_day(Day::Monday).len(), 1);
        assert_eq!(updated.entries_for_day(Day::Tuesday).len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_day_rejects_bad_entries() {
        let mut store = MemoryStore::new();
        let request = DayUpsert {
            class_id: "C1".into(),
            section_id: None,
            day_of_week: Day::Monday,
            entries: vec![
                entry(Day::Monday, 1, "08:00", "08:45"),
                entry(Day::Monday, 2, "08:30", "09:15"),
                entry(Day::Friday, 3, "10:00", "10:45"),
            ],
        };
        let err = upsert_day(&mut store, &request).unwrap_err();
        match err {
            TimetableError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_request_json() {
        let request: DayUpsert = serde_json::from_str(
            r#"{"classId":"C1","dayOfWeek":"Wednesday","entries":[]}"#,
        )
        .unwrap();
        assert_eq!(request.day_of_week, Day::Wednesday);
        assert_eq!(request.section_id, None);
    }
}
