//! Wall-clock times and time windows.
//!
//! Timetables are expressed in school-day clock times (`"09:30"`), not in
//! epoch offsets. Internally a [`ClockTime`] is minutes since midnight.
//!
//! # Overlap
//! A [`TimeWindow`] is the half-open interval `[start, end)`. Two windows
//! overlap iff `start1 < end2 && start2 < end1`; touching windows
//! (`09:00-09:45` and `09:45-10:30`) do not overlap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Minutes in a day. Clock times are always below this.
const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day with minute resolution.
///
/// Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u16,
}

/// Error parsing a `"HH:MM"` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time '{input}': expected HH:MM")]
pub struct ParseClockTimeError {
    input: String,
}

impl ClockTime {
    /// Creates a clock time from hours and minutes.
    ///
    /// Returns `None` if the time is not a valid time of day.
    pub fn new(hours: u16, minutes: u16) -> Option<Self> {
        if hours >= 24 || minutes >= 60 {
            return None;
        }
        Some(Self {
            minutes: hours * 60 + minutes,
        })
    }

    /// Creates a clock time from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self { minutes })
    }

    /// Creates a clock time from minutes since midnight, wrapping past
    /// the end of the day.
    pub const fn from_minutes_wrapping(minutes: u16) -> Self {
        Self {
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(self) -> u16 {
        self.minutes
    }

    /// Hour component (0-23).
    pub fn hour(self) -> u16 {
        self.minutes / 60
    }

    /// Minute component (0-59).
    pub fn minute(self) -> u16 {
        self.minutes % 60
    }

    /// Adds minutes, returning `None` past midnight.
    pub fn plus_minutes(self, minutes: u16) -> Option<Self> {
        Self::from_minutes(self.minutes.checked_add(minutes)?)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseClockTimeError {
            input: s.to_string(),
        };
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hours: u16 = h.parse().map_err(|_| err())?;
        let minutes: u16 = m.parse().map_err(|_| err())?;
        Self::new(hours, minutes).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ParseClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end. Ordered by start,
/// then end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: ClockTime,
    /// Interval end (exclusive).
    pub end: ClockTime,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Whether `start < end`.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Duration in minutes (zero for malformed windows).
    #[inline]
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    /// Whether a time falls within this window.
    #[inline]
    pub fn contains(&self, time: ClockTime) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        intervals_overlap(self.start, self.end, other.start, other.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Whether the half-open intervals `[start1, end1)` and `[start2, end2)`
/// overlap.
///
/// ```
/// use u_timetable::models::intervals_overlap;
///
/// assert!(intervals_overlap(0, 45, 30, 75));
/// assert!(!intervals_overlap(0, 45, 45, 90));
/// ```
#[inline]
pub fn intervals_overlap<T: PartialOrd>(start1: T, end1: T, start2: T, end2: T) -> bool {
    start1 < end2 && start2 < end1
}
