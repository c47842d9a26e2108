//! Error types for time values and calendar conversions.

use thiserror::Error;

/// Errors from constructing or converting time points.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TimeError {
    /// A Julian Date was NaN or infinite.
    #[error("time value is not finite")]
    NonFinite,
    /// The instant cannot be represented as a UTC date-time.
    #[error("time value outside representable UTC range: JD {0}")]
    OutOfRange(f64),
    /// Calendar fields were out of range.
    #[error("invalid calendar date: {0}")]
    InvalidCalendar(&'static str),
}
