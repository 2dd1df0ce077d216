//! Timetabling domain models.
//!
//! Provides the data types that describe a school week, what has to be
//! taught in it, and the timetables that come out.
//!
//! # Domain Mappings
//!
//! | u-timetable | General scheduling |
//! |-------------|--------------------|
//! | GridTemplate | Time horizon (discrete) |
//! | SubjectRequirement | Job with repetition count |
//! | PlacementTask | Operation |
//! | Teacher | Shared renewable resource |
//! | Timetable | Schedule |

mod grid;
mod subject;
mod task;
mod teacher;
mod time;
mod timetable;

pub use grid::{
    Day, Grid, GridSlot, GridTemplate, ParseDayError, Period, PositionRules, SlotAssignment,
};
pub use subject::{PlannedSubject, SubjectId, SubjectPlan, SubjectRequirement};
pub use task::PlacementTask;
pub use teacher::Teacher;
pub use time::{intervals_overlap, ClockTime, ParseClockTimeError, TimeWindow};
pub use timetable::{Timetable, TimetableEntry};
