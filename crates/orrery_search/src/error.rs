//! Error types for event search.

use orrery_time::TimePoint;
use thiserror::Error;

/// Failure reported by an injected oracle for a single query.
///
/// Scanners treat this as a missing sample; paginators propagate it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("oracle failed: {message}")]
pub struct OracleError {
    message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for OracleError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for OracleError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result of one oracle evaluation.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors from search entry points.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SearchError {
    /// Configuration rejected before any sampling took place.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// A [`CancelFlag`](crate::CancelFlag) was raised between steps.
    #[error("search cancelled")]
    Cancelled,
    /// A paginator oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// A paginator oracle returned an event before the cursor it was given.
    #[error("oracle returned event at {event} before cursor {cursor}")]
    OracleRegressed { cursor: TimePoint, event: TimePoint },
    /// A worker thread panicked.
    #[error("worker thread panicked")]
    Worker,
}
