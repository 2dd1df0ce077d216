//! Batch orchestration.
//!
//! Generates timetables for several class/section targets in one request.
//! Targets run sequentially in input order against one shared
//! [`ConflictTracker`], seeded from every persisted timetable. A target's
//! placements become visible to the next target only after it is placed and
//! saved. When overwriting, a target's own old timetable is released only in
//! that target's working copy, so a failed target keeps blocking its old
//! teacher slots. There is no backtracking
//! across targets, so input order is priority order.
//!
//! # Error policy
//! - Unusable request (no targets, duplicate targets, bad grid or options,
//!   store unreadable): the whole call fails.
//! - Anything else (bad subjects, infeasible placement, save failure) is
//!   recorded against that target and the batch continues.

use std::borrow::Cow;
use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{build_plan, ConflictTracker, GenerationOptions, Placer, TeacherAssigner};
use crate::error::{Result, TimetableError};
use crate::models::{
    Day, GridTemplate, Period, SubjectPlan, SubjectRequirement, Teacher, Timetable,
};
use crate::store::TimetableStore;
use crate::validation::{
    validate_options, validate_requirements, validate_teacher_references, validate_template,
    ValidationError, ValidationErrorKind,
};

/// One class/section to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTarget {
    /// Class.
    pub class_id: String,
    /// Section, if the class is split.
    #[serde(default)]
    pub section_id: Option<String>,
    /// Subjects for this target. Falls back to the batch defaults, then
    /// the store.
    #[serde(default)]
    pub subjects: Option<Vec<SubjectRequirement>>,
}

impl ClassTarget {
    /// Creates a target without its own subjects.
    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            section_id: None,
            subjects: None,
        }
    }

    /// Sets the section.
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Sets the subjects.
    pub fn with_subjects(mut self, subjects: Vec<SubjectRequirement>) -> Self {
        self.subjects = Some(subjects);
        self
    }

    fn key(&self) -> (&str, Option<&str>) {
        (&self.class_id, self.section_id.as_deref())
    }
}

/// Batch generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Targets, in priority order.
    pub classes: Vec<ClassTarget>,
    /// Days of the week. Defaults to Monday–Friday.
    #[serde(default)]
    pub days: Option<Vec<Day>>,
    /// Bell schedule. Defaults to [`GridTemplate::default_week`].
    #[serde(default)]
    pub periods: Option<Vec<Period>>,
    /// Generation options.
    #[serde(default)]
    pub options: GenerationOptions,
    /// Replace timetables that already exist for a target.
    #[serde(default)]
    pub overwrite_existing: bool,
    /// Subjects for targets that carry none.
    #[serde(default)]
    pub default_subjects: Option<Vec<SubjectRequirement>>,
}

impl BatchRequest {
    /// Creates a request with default grid and options.
    pub fn new(classes: Vec<ClassTarget>) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    /// Grid shared by every target.
    pub fn template(&self) -> GridTemplate {
        let fallback = GridTemplate::default_week();
        GridTemplate::new(
            self.days.clone().unwrap_or(fallback.days),
            self.periods.clone().unwrap_or(fallback.periods),
        )
    }
}

/// A target that was generated and saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTimetable {
    /// Class.
    pub class_id: String,
    /// Section.
    pub section_id: Option<String>,
    /// Entries written.
    pub entry_count: usize,
    /// Stored timetable id.
    pub timetable_id: String,
}

/// A target that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetError {
    /// Class.
    pub class_id: String,
    /// Section.
    pub section_id: Option<String>,
    /// Reason.
    pub error: String,
}

/// Batch result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Successful targets, in input order.
    pub generated: Vec<GeneratedTimetable>,
    /// Failed targets, in input order.
    pub errors: Vec<TargetError>,
}

/// Generates every target, seeding the RNG from `options.seed` or the OS.
pub fn generate_batch<S: TimetableStore + ?Sized>(
    request: &BatchRequest,
    store: &mut S,
) -> Result<BatchOutcome> {
    let mut rng = match request.options.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    generate_batch_with_rng(request, store, &mut rng)
}

/// Generates every target with a caller-supplied RNG.
pub fn generate_batch_with_rng<S, R>(
    request: &BatchRequest,
    store: &mut S,
    rng: &mut R,
) -> Result<BatchOutcome>
where
    S: TimetableStore + ?Sized,
    R: Rng + ?Sized,
{
    check_targets(&request.classes)?;
    let template = request.template();
    validate_template(&template)?;
    validate_options(&request.options)?;

    let existing = store.timetables()?;
    let teachers = store.teachers()?;

    // Every persisted timetable blocks its teachers until its own target
    // succeeds; a failed target's old timetable stays in force.
    let mut tracker = ConflictTracker::from_timetables(&existing);
    debug!(
        targets = request.classes.len(),
        seeded_teachers = tracker.teacher_count(),
        "batch started"
    );

    let mut assigner = TeacherAssigner::new(teachers.clone());
    let mut outcome = BatchOutcome::default();
    let ctx = TargetContext {
        request,
        template: &template,
        existing: &existing,
        teachers: &teachers,
    };

    for target in &request.classes {
        let result = ctx
            .place_target(target, &*store, &tracker, &assigner, rng)
            .and_then(|placed| {
                let id = store.save_timetable(placed.timetable.clone())?;
                Ok((placed, id))
            });

        match result {
            Ok((placed, timetable_id)) => {
                let entry_count = placed.timetable.entry_count();
                info!(
                    class = %target.class_id,
                    section = ?target.section_id,
                    entries = entry_count,
                    attempts = placed.attempts,
                    "timetable generated"
                );
                tracker = placed.tracker;
                assigner.record(&placed.plan);
                outcome.generated.push(GeneratedTimetable {
                    class_id: target.class_id.clone(),
                    section_id: target.section_id.clone(),
                    entry_count,
                    timetable_id,
                });
            }
            Err(e) => {
                warn!(
                    class = %target.class_id,
                    section = ?target.section_id,
                    error = %e,
                    "timetable generation failed"
                );
                outcome.errors.push(TargetError {
                    class_id: target.class_id.clone(),
                    section_id: target.section_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

fn check_targets(classes: &[ClassTarget]) -> Result<()> {
    if classes.is_empty() {
        return Err(TimetableError::InvalidBatch("no classes to generate".into()));
    }
    let mut seen = HashSet::new();
    for target in classes {
        if target.class_id.trim().is_empty() {
            return Err(TimetableError::InvalidBatch("a target has no classId".into()));
        }
        if !seen.insert(target.key()) {
            return Err(TimetableError::InvalidBatch(format!(
                "class {} section {:?} listed more than once",
                target.class_id, target.section_id
            )));
        }
    }
    Ok(())
}

struct PlacedTarget {
    timetable: Timetable,
    tracker: ConflictTracker,
    plan: SubjectPlan,
    attempts: u32,
}

struct TargetContext<'a> {
    request: &'a BatchRequest,
    template: &'a GridTemplate,
    existing: &'a [Timetable],
    teachers: &'a [Teacher],
}

impl TargetContext<'_> {
    fn subjects_for<S: TimetableStore + ?Sized>(
        &self,
        target: &ClassTarget,
        store: &S,
    ) -> Result<Vec<SubjectRequirement>> {
        if let Some(subjects) = &target.subjects {
            return Ok(subjects.clone());
        }
        if let Some(subjects) = &self.request.default_subjects {
            return Ok(subjects.clone());
        }
        store
            .class_subjects(&target.class_id, target.section_id.as_deref())?
            .ok_or_else(|| {
                TimetableError::Validation(vec![ValidationError::new(
                    ValidationErrorKind::MissingField,
                    format!("No subjects configured for class {}", target.class_id),
                )])
            })
    }

    fn place_target<S, R>(
        &self,
        target: &ClassTarget,
        store: &S,
        tracker: &ConflictTracker,
        assigner: &TeacherAssigner,
        rng: &mut R,
    ) -> Result<PlacedTarget>
    where
        S: TimetableStore + ?Sized,
        R: Rng + ?Sized,
    {
        let (class_id, section_id) = target.key();
        let previous = self
            .existing
            .iter()
            .find(|t| t.belongs_to(class_id, section_id));
        let start = match previous {
            Some(_) if !self.request.overwrite_existing => {
                return Err(TimetableError::Validation(vec![ValidationError::new(
                    ValidationErrorKind::AlreadyExists,
                    format!("Class {class_id} already has a timetable"),
                )]));
            }
            Some(previous) => {
                let mut released = tracker.clone();
                released.release(previous);
                Cow::Owned(released)
            }
            None => Cow::Borrowed(tracker),
        };

        let subjects = self.subjects_for(target, store)?;
        validate_requirements(&subjects, self.template)?;
        if !self.teachers.is_empty() {
            validate_teacher_references(&subjects, self.teachers)?;
        }

        let options = &self.request.options;
        let mut plan = build_plan(
            &subjects,
            self.template.teaching_slot_count(),
            self.template.day_count(),
        );
        if options.auto_assign_teachers {
            let assigned = assigner.assign(&mut plan);
            debug!(class = %class_id, assigned, "teachers auto-assigned");
        }

        let placed = Placer::new(self.template, &plan, options).place(&start, rng)?;
        let timetable = Timetable::new("", class_id, target.section_id.clone())
            .with_entries(placed.grid.entries(self.template, &plan));

        Ok(PlacedTarget {
            timetable,
            tracker: placed.tracker,
            plan,
            attempts: placed.attempts,
        })
    }
}
