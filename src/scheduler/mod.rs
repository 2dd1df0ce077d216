//! Timetable generation.
//!
//! The pipeline for one class/section is
//! [`build_plan`] → [`expand_tasks`] → [`Placer::place`]; the batch layer
//! runs it for many targets against one shared [`ConflictTracker`].
//!
//! # Algorithm
//!
//! Randomized depth-first backtracking with most-constrained-first task
//! ordering and bounded restarts. Not optimal: the first complete placement
//! found is returned.
//!
//! # References
//!
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod batch;
mod expand;
mod options;
mod placer;
mod plan;
mod tracker;

pub use batch::{
    generate_batch, generate_batch_with_rng, BatchOutcome, BatchRequest, ClassTarget,
    GeneratedTimetable, TargetError,
};
pub use expand::expand_tasks;
pub use options::GenerationOptions;
pub use placer::{
    InfeasibleReason, PlacementFailure, PlacementOutcome, Placer, SubjectDayCounts,
};
pub use plan::{build_plan, TeacherAssigner};
pub use tracker::{ConflictTracker, DayLoad};
