//! Generation options.
//!
//! Options arrive inside a batch request (JSON, camelCase) or from a TOML
//! file. Every field has a default, so `{}` and an empty file are valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Tunables for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Periods a teacher may teach on one day, across all classes.
    pub max_teacher_periods_per_day: u32,
    /// Fresh search attempts per class before giving up.
    pub max_attempts: u32,
    /// Honor subjects' `preferMorning` flags.
    pub prefer_morning_periods: bool,
    /// Ignore subjects' `maxPerDay`.
    pub allow_same_subject_multiple_per_day: bool,
    /// Fill missing teachers from the teacher pool by specialty.
    pub auto_assign_teachers: bool,
    /// Wall-clock budget for one class's search, in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Placement steps allowed in one attempt before it is abandoned.
    pub max_steps_per_attempt: u64,
    /// RNG seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_teacher_periods_per_day: 6,
            max_attempts: 40,
            prefer_morning_periods: true,
            allow_same_subject_multiple_per_day: false,
            auto_assign_teachers: false,
            deadline_ms: Some(5_000),
            max_steps_per_attempt: 50_000,
            seed: None,
        }
    }
}

impl GenerationOptions {
    /// Parses options from TOML.
    ///
    /// ```
    /// use u_timetable::scheduler::GenerationOptions;
    ///
    /// let opts = GenerationOptions::from_toml_str("maxAttempts = 5\nseed = 7").unwrap();
    /// assert_eq!(opts.max_attempts, 5);
    /// assert_eq!(opts.seed, Some(7));
    /// assert_eq!(opts.max_teacher_periods_per_day, 6);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Sets the teacher daily cap.
    pub fn with_max_teacher_periods_per_day(mut self, periods: u32) -> Self {
        self.max_teacher_periods_per_day = periods;
        self
    }

    /// Sets the attempt limit.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Turns morning preferences on or off.
    pub fn with_prefer_morning(mut self, enabled: bool) -> Self {
        self.prefer_morning_periods = enabled;
        self
    }

    /// Allows subjects beyond their daily cap.
    pub fn with_same_subject_multiple_per_day(mut self, allowed: bool) -> Self {
        self.allow_same_subject_multiple_per_day = allowed;
        self
    }

    /// Enables teacher auto-assignment.
    pub fn with_auto_assign_teachers(mut self, enabled: bool) -> Self {
        self.auto_assign_teachers = enabled;
        self
    }

    /// Sets or clears the wall-clock deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline_ms = deadline.map(|d| d.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Sets the per-attempt step budget.
    pub fn with_max_steps_per_attempt(mut self, steps: u64) -> Self {
        self.max_steps_per_attempt = steps;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Wall-clock deadline as a duration.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
