//! Crate error type.

use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Errors raised while generating or editing timetables.
///
/// Conflicts found by [`check_conflicts`](crate::conflict::check_conflicts)
/// are not errors; they come back as a [`ConflictReport`](crate::conflict::ConflictReport).
#[derive(Debug, Error)]
pub enum TimetableError {
    /// Malformed input, detected before any search.
    #[error("invalid input: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),
    /// The placer ran out of attempts or time.
    #[error("no valid timetable found after {attempts} attempt(s): {reason}")]
    Infeasible { reason: String, attempts: u32 },
    /// Persisting a result failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    /// The batch request itself is unusable.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<Vec<ValidationError>> for TimetableError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, TimetableError>;
