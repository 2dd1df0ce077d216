//! Automatic class-timetable generation.
//!
//! Places a week of lessons for one or more classes onto a grid of teaching
//! periods so that no teacher is double-booked, daily limits hold, lab
//! subjects get double periods and time-of-day rules are respected.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Day`, `Period`, `GridTemplate`, `Grid`,
//!   `SubjectRequirement`, `PlacementTask`, `Teacher`, `Timetable`
//! - **`scheduler`**: Plan builder, task expander, conflict tracker,
//!   backtracking placer and batch orchestration
//! - **`conflict`**: Teacher/room conflict check for manual edits
//! - **`store`**: Storage seam (`TimetableStore`, `MemoryStore`) and the
//!   single-day upsert
//! - **`validation`**: Input integrity checks (grid shape, subject counts,
//!   contradictory rules, unknown teachers)
//!
//! # Example
//!
//! ```
//! use u_timetable::models::SubjectRequirement;
//! use u_timetable::scheduler::{generate_batch, BatchRequest, ClassTarget, GenerationOptions};
//! use u_timetable::store::MemoryStore;
//!
//! let mut request = BatchRequest::new(vec![ClassTarget::new("7").with_subjects(vec![
//!     SubjectRequirement::new("MATH", "Mathematics").with_teacher("T1").with_weekly_count(6),
//!     SubjectRequirement::new("PHY", "Physics").with_teacher("T2").lab().with_weekly_count(4),
//! ])]);
//! request.options = GenerationOptions::default().with_seed(42);
//!
//! let mut store = MemoryStore::new();
//! let outcome = generate_batch(&request, &mut store).unwrap();
//! assert_eq!(outcome.generated[0].entry_count, 10);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Russell & Norvig (2020), "Artificial Intelligence: A Modern Approach", Ch. 6

pub mod conflict;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use error::{Result, TimetableError};
