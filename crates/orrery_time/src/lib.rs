//! Continuous time values for the event-search engine.
//!
//! This crate provides:
//! - [`TimePoint`], a totally ordered instant expressed as a Julian Date
//! - Julian Date <-> calendar conversions
//! - A UTC bridge through `chrono`
//!
//! The search engine only adds durations to and subtracts `TimePoint`s;
//! calendar meaning is confined to this crate.

pub mod error;
pub mod julian;
pub mod utc;

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

pub use error::TimeError;
pub use julian::{
    J2000_JD, MINUTES_PER_DAY, SECONDS_PER_DAY, UNIX_EPOCH_JD, calendar_to_jd, jd_to_calendar,
    minutes_to_days,
};

/// An instant on a continuous time line, stored as a Julian Date in days.
///
/// Ordering, equality and hashing follow [`f64::total_cmp`], so `TimePoint`
/// can be used as a map key and sorted without special cases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(f64);

impl TimePoint {
    /// Wrap a Julian Date without validation.
    pub const fn new(jd: f64) -> Self {
        Self(jd)
    }

    /// Wrap a Julian Date, rejecting NaN and infinities.
    pub fn try_new(jd: f64) -> Result<Self, TimeError> {
        if jd.is_finite() {
            Ok(Self(jd))
        } else {
            Err(TimeError::NonFinite)
        }
    }

    /// Julian Date in days.
    pub const fn jd(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Shift by a signed number of days.
    pub fn add_days(self, days: f64) -> Self {
        Self(self.0 + days)
    }

    /// Signed duration in days from `earlier` to `self`.
    pub fn days_since(self, earlier: TimePoint) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for TimePoint {}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for TimePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Add<f64> for TimePoint {
    type Output = TimePoint;

    fn add(self, days: f64) -> TimePoint {
        self.add_days(days)
    }
}

impl Sub<f64> for TimePoint {
    type Output = TimePoint;

    fn sub(self, days: f64) -> TimePoint {
        self.add_days(-days)
    }
}

impl Sub<TimePoint> for TimePoint {
    type Output = f64;

    fn sub(self, rhs: TimePoint) -> f64 {
        self.days_since(rhs)
    }
}

impl Display for TimePoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "JD {:.6}", self.0)
    }
}
