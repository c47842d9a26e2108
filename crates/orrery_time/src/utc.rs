//! UTC bridge: converting between `TimePoint` and `chrono` date-times.
//!
//! Julian Dates here are on the UTC time line (leap seconds ignored); the
//! search engine only needs a consistent continuous scale.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::TimeError;
use crate::julian::{SECONDS_PER_DAY, UNIX_EPOCH_JD};
use crate::TimePoint;

impl TimePoint {
    /// Convert a UTC date-time to a time point.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
        Self::new(UNIX_EPOCH_JD + secs / SECONDS_PER_DAY)
    }

    /// The current instant.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Build a time point from UTC calendar fields.
    ///
    /// The date must exist in the proleptic Gregorian calendar. `second` may
    /// reach into a leap second (`[60, 61)`).
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self, TimeError> {
        if !second.is_finite() || !(0.0..61.0).contains(&second) {
            return Err(TimeError::InvalidCalendar("second must be in [0, 61)"));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(TimeError::InvalidCalendar("no such date"))?;

        let whole = second.floor();
        let nanos = (((second - whole) * 1e9).round() as u32).min(999_999_999);
        // chrono encodes a leap second as second 59 with nanos >= 1e9.
        let time = if whole >= 60.0 {
            NaiveTime::from_hms_nano_opt(hour, minute, 59, 1_000_000_000 + nanos)
        } else {
            NaiveTime::from_hms_nano_opt(hour, minute, whole as u32, nanos)
        }
        .ok_or(TimeError::InvalidCalendar("no such time of day"))?;

        Ok(Self::from_utc(NaiveDateTime::new(date, time).and_utc()))
    }

    /// Convert back to a UTC date-time, rounded to the nearest microsecond.
    pub fn to_utc(self) -> Result<DateTime<Utc>, TimeError> {
        if !self.is_finite() {
            return Err(TimeError::NonFinite);
        }
        let micros = ((self.jd() - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1e6).round();
        if micros.abs() > i64::MAX as f64 {
            return Err(TimeError::OutOfRange(self.jd()));
        }
        DateTime::from_timestamp_micros(micros as i64).ok_or(TimeError::OutOfRange(self.jd()))
    }
}
