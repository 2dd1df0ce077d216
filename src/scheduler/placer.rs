//! Randomized backtracking placer.
//!
//! # Algorithm
//!
//! 1. Expand the plan into tasks and order them: double periods first, then
//!    subjects with the fewest statically allowed positions, then subjects
//!    with the largest weekly count.
//! 2. Depth-first over the ordered tasks. For each task, collect every
//!    currently feasible (day, position), shuffle, and try them in turn:
//!    place, recurse, undo on failure.
//! 3. A dead end restarts the whole search with an empty grid, a fresh
//!    shuffle and a fresh copy of the starting tracker, up to
//!    `max_attempts` times.
//!
//! The search is bounded three ways: attempts, placement steps per attempt,
//! and an optional wall-clock deadline.
//!
//! # Feasibility
//! A task fits at (day, position) iff every leg is a free teaching slot
//! that the subject's rules permit, the subject is under its daily cap,
//! and its teacher (if any) is free in every leg and stays within the
//! teacher's daily period cap.
//!
//! # Complexity
//! Worst case exponential in the task count; the bounds above make it
//! O(max_attempts × max_steps × slots) per class.
//!
//! # Reference
//! Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach",
//! Ch. 6.3 (backtracking search, most-constrained-variable ordering)

use std::fmt;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::{expand_tasks, ConflictTracker, GenerationOptions};
use crate::error::TimetableError;
use crate::models::{
    Grid, GridTemplate, PlacementTask, PlannedSubject, PositionRules, SlotAssignment, SubjectId,
    SubjectPlan,
};

/// Placements of each subject per day, tracked apart from teachers.
///
/// Counts task placements: a double period counts once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDayCounts {
    days: usize,
    counts: Vec<u32>,
}

impl SubjectDayCounts {
    /// Creates zeroed counters for `subjects` × `days`.
    pub fn new(subjects: usize, days: usize) -> Self {
        Self {
            days,
            counts: vec![0; subjects * days],
        }
    }

    fn offset(&self, subject: SubjectId, day_pos: usize) -> usize {
        subject.index() * self.days + day_pos
    }

    /// Placements of `subject` on the day at `day_pos`.
    pub fn get(&self, subject: SubjectId, day_pos: usize) -> u32 {
        self.counts
            .get(self.offset(subject, day_pos))
            .copied()
            .unwrap_or(0)
    }

    /// Adds one placement.
    pub fn increment(&mut self, subject: SubjectId, day_pos: usize) {
        let i = self.offset(subject, day_pos);
        if let Some(c) = self.counts.get_mut(i) {
            *c += 1;
        }
    }

    /// Removes one placement.
    pub fn decrement(&mut self, subject: SubjectId, day_pos: usize) {
        let i = self.offset(subject, day_pos);
        if let Some(c) = self.counts.get_mut(i) {
            *c = c.saturating_sub(1);
        }
    }
}

/// Why no timetable was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// The plan asks for more periods than the week has.
    OverCapacity { required: u32, available: usize },
    /// A subject's rules exclude every slot in the grid.
    NoAllowedSlot { subject: String },
    /// Every attempt dead-ended.
    AttemptsExhausted,
    /// The wall-clock deadline passed.
    DeadlineExceeded { deadline: Duration },
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverCapacity {
                required,
                available,
            } => write!(
                f,
                "subjects need {required} periods but only {available} teaching slots exist"
            ),
            Self::NoAllowedSlot { subject } => {
                write!(f, "no slot in the grid satisfies the rules of subject '{subject}'")
            }
            Self::AttemptsExhausted => f.write_str(
                "constraints could not be satisfied (teacher availability, daily limits or placement rules)",
            ),
            Self::DeadlineExceeded { deadline } => {
                write!(f, "search deadline of {} ms exceeded", deadline.as_millis())
            }
        }
    }
}

/// A successful placement.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    /// Filled grid.
    pub grid: Grid,
    /// Starting tracker plus this class's placements.
    pub tracker: ConflictTracker,
    /// Attempt that succeeded (1-based).
    pub attempts: u32,
}

/// A failed placement, with the deepest partial grid reached.
#[derive(Debug, Clone)]
pub struct PlacementFailure {
    /// Cause.
    pub reason: InfeasibleReason,
    /// Attempts started.
    pub attempts: u32,
    /// Deepest partial grid. Respects every rule except completeness.
    pub best_grid: Grid,
    /// Tasks placed in `best_grid`.
    pub placed_tasks: usize,
    /// Tasks required.
    pub total_tasks: usize,
}

impl From<PlacementFailure> for TimetableError {
    fn from(failure: PlacementFailure) -> Self {
        TimetableError::Infeasible {
            reason: format!(
                "{} ({} of {} placements made)",
                failure.reason, failure.placed_tasks, failure.total_tasks
            ),
            attempts: failure.attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Placed,
    Exhausted,
    OutOfSteps,
    DeadlineExceeded,
}

struct Budget {
    steps: u64,
    max_steps: u64,
    deadline: Option<Instant>,
}

impl Budget {
    fn tick(&mut self) -> Option<Step> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Some(Step::OutOfSteps);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(Step::DeadlineExceeded),
            _ => None,
        }
    }
}

struct SearchState {
    grid: Grid,
    tracker: ConflictTracker,
    day_counts: SubjectDayCounts,
}

struct BestPartial {
    depth: usize,
    grid: Grid,
}

/// Places one class's subjects onto a week grid.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_timetable::models::{GridTemplate, SubjectRequirement};
/// use u_timetable::scheduler::{build_plan, ConflictTracker, GenerationOptions, Placer};
///
/// let template = GridTemplate::default_week();
/// let plan = build_plan(
///     &[
///         SubjectRequirement::new("MATH", "Math").with_teacher("T1").with_weekly_count(6),
///         SubjectRequirement::new("PHY", "Physics").with_teacher("T2").lab().with_weekly_count(4),
///     ],
///     template.teaching_slot_count(),
///     template.day_count(),
/// );
/// let options = GenerationOptions::default();
/// let placer = Placer::new(&template, &plan, &options);
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let outcome = placer.place(&ConflictTracker::new(), &mut rng).unwrap();
/// assert_eq!(outcome.grid.filled_count(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct Placer<'a> {
    template: &'a GridTemplate,
    plan: &'a SubjectPlan,
    options: &'a GenerationOptions,
    rules: PositionRules,
}

impl<'a> Placer<'a> {
    /// Creates a placer.
    pub fn new(
        template: &'a GridTemplate,
        plan: &'a SubjectPlan,
        options: &'a GenerationOptions,
    ) -> Self {
        Self {
            template,
            plan,
            options,
            rules: template.position_rules(),
        }
    }

    /// Searches for a complete placement.
    ///
    /// `start` is never modified; each attempt works on its own clone. On
    /// success the returned tracker is `start` plus every placement made.
    pub fn place<R: Rng + ?Sized>(
        &self,
        start: &ConflictTracker,
        rng: &mut R,
    ) -> Result<PlacementOutcome, PlacementFailure> {
        let tasks = self.ordered_tasks();
        let total_tasks = tasks.len();
        let mut best = BestPartial {
            depth: 0,
            grid: Grid::empty(self.template),
        };

        let fail = |reason, attempts, best: BestPartial| PlacementFailure {
            reason,
            attempts,
            best_grid: best.grid,
            placed_tasks: best.depth,
            total_tasks,
        };

        let required = self.plan.total_weekly();
        let available = self.template.teaching_slot_count();
        if required as usize > available {
            return Err(fail(
                InfeasibleReason::OverCapacity {
                    required,
                    available,
                },
                0,
                best,
            ));
        }
        if let Some(task) = tasks.iter().find(|t| self.static_positions(t) == 0) {
            let subject = self
                .subject(task.subject)
                .map(|s| s.key.clone())
                .unwrap_or_else(|| task.subject.to_string());
            return Err(fail(InfeasibleReason::NoAllowedSlot { subject }, 0, best));
        }

        let deadline = self.options.deadline();
        let started = Instant::now();

        for attempt in 1..=self.options.max_attempts.max(1) {
            let mut state = SearchState {
                grid: Grid::empty(self.template),
                tracker: start.clone(),
                day_counts: SubjectDayCounts::new(self.plan.len(), self.template.day_count()),
            };
            let mut budget = Budget {
                steps: 0,
                max_steps: self.options.max_steps_per_attempt,
                deadline: deadline.map(|d| started + d),
            };

            match self.search(&tasks, 0, &mut state, rng, &mut budget, &mut best) {
                Step::Placed => {
                    debug!(attempt, tasks = total_tasks, steps = budget.steps, "placement found");
                    return Ok(PlacementOutcome {
                        grid: state.grid,
                        tracker: state.tracker,
                        attempts: attempt,
                    });
                }
                Step::DeadlineExceeded => {
                    let deadline = deadline.unwrap_or_default();
                    warn!(attempt, deadline_ms = deadline.as_millis() as u64, "placement deadline exceeded");
                    return Err(fail(
                        InfeasibleReason::DeadlineExceeded { deadline },
                        attempt,
                        best,
                    ));
                }
                step => {
                    debug!(attempt, ?step, deepest = best.depth, "attempt dead-ended");
                }
            }
        }

        Err(fail(
            InfeasibleReason::AttemptsExhausted,
            self.options.max_attempts.max(1),
            best,
        ))
    }

    /// Tasks in search order.
    fn ordered_tasks(&self) -> Vec<PlacementTask> {
        let mut tasks = expand_tasks(self.plan);
        let mut estimate = std::collections::HashMap::new();
        for t in &tasks {
            estimate
                .entry((t.subject, t.length))
                .or_insert_with(|| self.static_positions(t));
        }
        let weekly = |t: &PlacementTask| self.subject(t.subject).map_or(0, |s| s.weekly_count);

        tasks.sort_by(|a, b| {
            b.length
                .cmp(&a.length)
                .then_with(|| estimate[&(a.subject, a.length)].cmp(&estimate[&(b.subject, b.length)]))
                .then_with(|| weekly(b).cmp(&weekly(a)))
        });
        tasks
    }

    /// Positions in an empty grid where `task` could ever go.
    fn static_positions(&self, task: &PlacementTask) -> usize {
        let Some(subject) = self.subject(task.subject) else {
            return 0;
        };
        let per_day = (0..self.template.period_count())
            .filter(|&pos| self.legs_allowed(subject, task, pos))
            .count();
        per_day * self.template.day_count()
    }

    fn subject(&self, id: SubjectId) -> Option<&PlannedSubject> {
        self.plan.get(id)
    }

    /// Rule check for every leg, ignoring grid state.
    fn legs_allowed(&self, subject: &PlannedSubject, task: &PlacementTask, pos: usize) -> bool {
        task.legs(pos).all(|leg| {
            self.template
                .periods
                .get(leg)
                .is_some_and(|p| !p.is_break)
                && subject.permits(leg, &self.rules, self.options.prefer_morning_periods)
        })
    }

    fn can_place(
        &self,
        task: &PlacementTask,
        day_pos: usize,
        pos: usize,
        state: &SearchState,
    ) -> bool {
        let Some(subject) = self.subject(task.subject) else {
            return false;
        };
        if !self.legs_allowed(subject, task, pos) {
            return false;
        }
        if !task.legs(pos).all(|leg| state.grid.is_free(day_pos, leg)) {
            return false;
        }
        if !self.options.allow_same_subject_multiple_per_day
            && state.day_counts.get(task.subject, day_pos) >= subject.max_per_day
        {
            return false;
        }
        if let Some(teacher) = &subject.teacher_id {
            let day = self.template.days[day_pos];
            let busy = task.legs(pos).any(|leg| {
                state
                    .tracker
                    .is_busy(teacher, day, &self.template.periods[leg].window())
            });
            if busy {
                return false;
            }
            let worked = state.tracker.day_count(teacher, day);
            if worked + u32::from(task.length) > self.options.max_teacher_periods_per_day {
                return false;
            }
        }
        true
    }

    fn candidates(&self, task: &PlacementTask, state: &SearchState) -> Vec<(usize, usize)> {
        let periods = self.template.period_count();
        (0..self.template.day_count())
            .flat_map(|d| (0..periods).map(move |p| (d, p)))
            .filter(|&(d, p)| self.can_place(task, d, p, state))
            .collect()
    }

    fn apply(&self, task: &PlacementTask, day_pos: usize, pos: usize, state: &mut SearchState) {
        let teacher = self.subject(task.subject).and_then(|s| s.teacher_id.as_deref());
        let day = self.template.days[day_pos];
        for (leg_no, leg) in task.legs(pos).enumerate() {
            state.grid.assign(
                day_pos,
                leg,
                SlotAssignment {
                    subject: task.subject,
                    length: task.length,
                    leg: leg_no as u8,
                },
            );
            if let Some(teacher) = teacher {
                let period = &self.template.periods[leg];
                state
                    .tracker
                    .mark(teacher, day, period.index, period.window());
            }
        }
        state.day_counts.increment(task.subject, day_pos);
    }

    fn undo(&self, task: &PlacementTask, day_pos: usize, pos: usize, state: &mut SearchState) {
        let teacher = self.subject(task.subject).and_then(|s| s.teacher_id.as_deref());
        let day = self.template.days[day_pos];
        for leg in task.legs(pos) {
            state.grid.clear(day_pos, leg);
            if let Some(teacher) = teacher {
                state
                    .tracker
                    .unmark(teacher, day, &self.template.periods[leg].window());
            }
        }
        state.day_counts.decrement(task.subject, day_pos);
    }

    fn search<R: Rng + ?Sized>(
        &self,
        tasks: &[PlacementTask],
        depth: usize,
        state: &mut SearchState,
        rng: &mut R,
        budget: &mut Budget,
        best: &mut BestPartial,
    ) -> Step {
        if depth > best.depth {
            best.depth = depth;
            best.grid = state.grid.clone();
        }
        let Some(task) = tasks.get(depth) else {
            return Step::Placed;
        };
        if let Some(stop) = budget.tick() {
            return stop;
        }

        let mut candidates = self.candidates(task, state);
        candidates.shuffle(rng);

        for (day_pos, pos) in candidates {
            self.apply(task, day_pos, pos, state);
            match self.search(tasks, depth + 1, state, rng, budget, best) {
                Step::Placed => return Step::Placed,
                Step::Exhausted => self.undo(task, day_pos, pos, state),
                stop => {
                    self.undo(task, day_pos, pos, state);
                    return stop;
                }
            }
        }
        Step::Exhausted
    }
}
