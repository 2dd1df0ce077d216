//! Placement task model.
//!
//! A task is the atomic unit the search places: one period, or a double
//! period for lab subjects. Tasks are cheap `Copy` values referencing their
//! subject by [`SubjectId`].

use serde::{Deserialize, Serialize};

use super::SubjectId;

/// One unit of placement work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementTask {
    /// Subject being placed.
    pub subject: SubjectId,
    /// Consecutive periods required (1 or 2).
    pub length: u8,
    /// Whether the subject is a lab.
    pub is_lab: bool,
}

impl PlacementTask {
    /// Creates a single-period task.
    pub fn single(subject: SubjectId, is_lab: bool) -> Self {
        Self {
            subject,
            length: 1,
            is_lab,
        }
    }

    /// Creates a double-period lab task.
    pub fn double(subject: SubjectId) -> Self {
        Self {
            subject,
            length: 2,
            is_lab: true,
        }
    }

    /// Whether the task spans two periods.
    #[inline]
    pub fn is_double(&self) -> bool {
        self.length == 2
    }

    /// Positions covered when starting at `position`.
    pub fn legs(&self, position: usize) -> std::ops::Range<usize> {
        position..position + self.length as usize
    }
}
