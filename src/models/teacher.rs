//! Teacher model.
//!
//! Teachers are the shared resource of a batch: a teacher can stand in
//! only one room per period, across every class.

use serde::{Deserialize, Serialize};

/// A teacher record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Subject ids this teacher can take (specialties).
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl Teacher {
    /// Creates a teacher without specialties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            subjects: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a specialty.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subjects.push(subject_id.into());
        self
    }

    /// Whether the teacher can take `subject_id`.
    pub fn can_teach(&self, subject_id: &str) -> bool {
        self.subjects.iter().any(|s| s == subject_id)
    }
}
