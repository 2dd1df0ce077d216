//! Input validation for timetable generation.
//!
//! Checks structural integrity of grid templates, subject requirements and
//! manually edited entries before any search runs. Detects:
//! - Malformed bell schedules (empty, overlapping, unordered periods)
//! - Duplicate subject keys and zero counts
//! - Weekly demand larger than the week
//! - Contradictory or unsatisfiable placement rules
//! - Unknown teacher references
//!
//! Every check runs; all problems are reported together.

use std::collections::HashSet;
use std::fmt;

use crate::models::{Day, GridTemplate, SubjectRequirement, Teacher, TimetableEntry};
use crate::scheduler::GenerationOptions;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required field is empty.
    MissingField,
    /// Two entities share the same key.
    DuplicateId,
    /// A count or limit is zero or out of range.
    InvalidCount,
    /// The grid template is malformed.
    InvalidGrid,
    /// A time window has `start >= end`.
    InvalidTime,
    /// Requested occurrences exceed available slots.
    CapacityExceeded,
    /// Placement rules cannot be met by any slot.
    UnsatisfiableRule,
    /// A referenced teacher does not exist.
    UnknownReference,
    /// An entry is for a different day than the one being edited.
    DayMismatch,
    /// Two entries of the same edit overlap in time.
    OverlappingEntries,
    /// The target already has a timetable and overwriting is off.
    AlreadyExists,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a grid template.
///
/// Checks:
/// 1. At least one day, no day listed twice
/// 2. At least one non-break period
/// 3. Unique period indices
/// 4. `start < end` for every period
/// 5. Periods ordered by start time and non-overlapping
pub fn validate_template(template: &GridTemplate) -> ValidationResult {
    let mut errors = Vec::new();

    if template.days.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidGrid,
            "Grid has no days",
        ));
    }
    let mut seen_days = HashSet::new();
    for day in &template.days {
        if !seen_days.insert(*day) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Day {day} listed more than once"),
            ));
        }
    }

    if template.teaching_periods_per_day() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidGrid,
            "Grid has no teaching periods",
        ));
    }

    let mut seen_indices = HashSet::new();
    for p in &template.periods {
        if !seen_indices.insert(p.index) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate period index: {}", p.index),
            ));
        }
        if !p.window().is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTime,
                format!("Period {} ends before it starts ({})", p.index, p.window()),
            ));
        }
    }

    for pair in template.periods.windows(2) {
        if pair[1].start_time < pair[0].end_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidGrid,
                format!(
                    "Period {} ({}) overlaps or precedes period {} ({})",
                    pair[1].index,
                    pair[1].window(),
                    pair[0].index,
                    pair[0].window()
                ),
            ));
        }
    }

    finish(errors)
}

/// Validates a class's subject requirements against the week they must
/// fit into.
///
/// Checks:
/// 1. Non-empty list, `subject_id` present
/// 2. Unique effective keys
/// 3. Explicit `weekly_count` / `max_per_day` at least 1
/// 4. Explicit weekly counts fit the teaching slots
/// 5. `prefer_morning` and `after_break_only` not combined
/// 6. `after_break_only` only with a break in the grid
/// 7. Lab subjects needing a pair only where two teaching periods touch
pub fn validate_requirements(
    requirements: &[SubjectRequirement],
    template: &GridTemplate,
) -> ValidationResult {
    let mut errors = Vec::new();

    if requirements.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingField,
            "No subjects to schedule",
        ));
    }

    let mut keys = HashSet::new();
    let mut explicit_total: u64 = 0;

    for req in requirements {
        if req.subject_id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("Subject '{}' has no subjectId", req.name),
            ));
        }

        let key = req.effective_key();
        if !keys.insert(key) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate subject key: {key}"),
            ));
        }

        if req.weekly_count == Some(0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCount,
                format!("Subject '{key}' has weeklyCount 0"),
            ));
        }
        if req.max_per_day == Some(0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCount,
                format!("Subject '{key}' has maxPerDay 0"),
            ));
        }
        explicit_total += u64::from(req.weekly_count.unwrap_or(0));

        if req.prefer_morning && req.after_break_only {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsatisfiableRule,
                format!("Subject '{key}' cannot be both morning-only and after-break-only"),
            ));
        }
        if req.after_break_only && template.break_position().is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsatisfiableRule,
                format!("Subject '{key}' is after-break-only but the grid has no break"),
            ));
        }
        if req.is_lab && req.weekly_count.unwrap_or(2) >= 2 && !template.has_double_slot() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnsatisfiableRule,
                format!("Lab subject '{key}' needs two adjacent teaching periods"),
            ));
        }
    }

    let capacity = template.teaching_slot_count() as u64;
    if explicit_total > capacity {
        errors.push(ValidationError::new(
            ValidationErrorKind::CapacityExceeded,
            format!("Subjects need {explicit_total} periods but the week has {capacity}"),
        ));
    }

    finish(errors)
}

/// Validates that every pre-assigned teacher exists in `teachers`.
pub fn validate_teacher_references(
    requirements: &[SubjectRequirement],
    teachers: &[Teacher],
) -> ValidationResult {
    let known: HashSet<&str> = teachers.iter().map(|t| t.id.as_str()).collect();
    let errors = requirements
        .iter()
        .filter_map(|req| {
            let teacher = req.teacher_id.as_deref()?;
            (!known.contains(teacher)).then(|| {
                ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Subject '{}' references unknown teacher '{teacher}'",
                        req.effective_key()
                    ),
                )
            })
        })
        .collect();
    finish(errors)
}

/// Validates generation options.
pub fn validate_options(options: &GenerationOptions) -> ValidationResult {
    let mut errors = Vec::new();
    if options.max_attempts == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCount,
            "maxAttempts must be at least 1",
        ));
    }
    if options.max_teacher_periods_per_day == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCount,
            "maxTeacherPeriodsPerDay must be at least 1",
        ));
    }
    finish(errors)
}

/// Validates a single-day edit: every entry is on `day`, well-formed, and
/// no two entries overlap.
pub fn validate_day_entries(day: Day, entries: &[TimetableEntry]) -> ValidationResult {
    let mut errors = Vec::new();

    for (i, e) in entries.iter().enumerate() {
        if e.day != day {
            errors.push(ValidationError::new(
                ValidationErrorKind::DayMismatch,
                format!("Entry {i} is for {} but the edit is for {day}", e.day),
            ));
        }
        if e.subject_id.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingField,
                format!("Entry {i} has no subjectId"),
            ));
        }
        if !e.window().is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTime,
                format!("Entry {i} ends before it starts ({})", e.window()),
            ));
        }
    }

    for (i, a) in entries.iter().enumerate() {
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            if a.window().overlaps(&b.window()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::OverlappingEntries,
                    format!("Entries {i} ({}) and {j} ({}) overlap", a.window(), b.window()),
                ));
            }
        }
    }

    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClockTime, Period};

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn template() -> GridTemplate {
        GridTemplate::default_week()
    }

    #[test]
    fn test_valid_template() {
        assert!(validate_template(&template()).is_ok());
    }

    #[test]
    fn test_template_without_days() {
        let tpl = GridTemplate::new(vec![], template().periods);
        let errors = validate_template(&tpl).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidGrid));
    }

    #[test]
    fn test_template_duplicate_day_and_index() {
        let mut tpl = template();
        tpl.days.push(Day::Monday);
        tpl.periods[1].index = 1;
        let errors = validate_template(&tpl).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::DuplicateId)
                .count(),
            2
        );
    }

    #[test]
    fn test_template_overlapping_periods() {
        let tpl = GridTemplate::new(
            vec![Day::Monday],
            vec![
                Period::new(1, t("08:00"), t("08:45")),
                Period::new(2, t("08:30"), t("09:15")),
            ],
        );
        let errors = validate_template(&tpl).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidGrid));
    }

    #[test]
    fn test_template_inverted_period() {
        let tpl = GridTemplate::new(
            vec![Day::Monday],
            vec![Period::new(1, t("09:00"), t("08:00"))],
        );
        let errors = validate_template(&tpl).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidTime));
    }

    #[test]
    fn test_valid_requirements() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_weekly_count(6),
            SubjectRequirement::new("PHY", "Physics").lab().with_weekly_count(4),
            SubjectRequirement::new("ART", "Art"),
        ];
        assert!(validate_requirements(&reqs, &template()).is_ok());
    }

    #[test]
    fn test_duplicate_key() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math"),
            SubjectRequirement::new("MATH", "Math again"),
        ];
        let errors = validate_requirements(&reqs, &template()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));

        // Distinct keys for the same subject are fine.
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_key("math-1"),
            SubjectRequirement::new("MATH", "Math").with_key("math-2"),
        ];
        assert!(validate_requirements(&reqs, &template()).is_ok());
    }

    #[test]
    fn test_capacity_exceeded() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_weekly_count(30),
            SubjectRequirement::new("ENG", "English").with_weekly_count(10),
        ];
        let errors = validate_requirements(&reqs, &template()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CapacityExceeded));
    }

    #[test]
    fn test_contradictory_rules() {
        let reqs = vec![SubjectRequirement::new("PE", "Sport").morning().after_break()];
        let errors = validate_requirements(&reqs, &template()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnsatisfiableRule));
    }

    #[test]
    fn test_after_break_without_break() {
        let mut tpl = template();
        tpl.periods.iter_mut().for_each(|p| p.is_break = false);
        let reqs = vec![SubjectRequirement::new("PE", "Sport").after_break()];
        let errors = validate_requirements(&reqs, &tpl).unwrap_err();
        assert!(errors[0].message.contains("no break"));
    }

    #[test]
    fn test_zero_counts_and_empty() {
        let reqs = vec![SubjectRequirement::new("MATH", "Math")
            .with_weekly_count(0)
            .with_max_per_day(0)];
        let errors = validate_requirements(&reqs, &template()).unwrap_err();
        assert_eq!(errors.len(), 2);

        let errors = validate_requirements(&[], &template()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_teacher_references() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_teacher("T1"),
            SubjectRequirement::new("ART", "Art").with_teacher("T9"),
            SubjectRequirement::new("PE", "Sport"),
        ];
        let teachers = vec![Teacher::new("T1")];
        let errors = validate_teacher_references(&reqs, &teachers).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("T9"));
    }

    #[test]
    fn test_options() {
        assert!(validate_options(&GenerationOptions::default()).is_ok());
        let bad = GenerationOptions::default().with_max_attempts(0);
        assert!(validate_options(&bad).is_err());
    }

    #[test]
    fn test_day_entries() {
        let ok = vec![
            TimetableEntry::new(Day::Monday, 1, "MATH", t("08:00"), t("08:45")),
            TimetableEntry::new(Day::Monday, 2, "ART", t("08:45"), t("09:30")),
        ];
        assert!(validate_day_entries(Day::Monday, &ok).is_ok());

        let bad = vec![
            TimetableEntry::new(Day::Monday, 1, "MATH", t("08:00"), t("08:45")),
            TimetableEntry::new(Day::Monday, 2, "ART", t("08:30"), t("09:15")),
            TimetableEntry::new(Day::Tuesday, 3, "PE", t("10:00"), t("09:00")),
        ];
        let errors = validate_day_entries(Day::Monday, &bad).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::DayMismatch));
        assert!(kinds.contains(&ValidationErrorKind::InvalidTime));
        assert!(kinds.contains(&ValidationErrorKind::OverlappingEntries));
    }
}
