//! Cooperative cancellation for long scans.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SearchError;

/// Shared stop flag, checked once per scan step.
///
/// Clones observe the same flag, so one handle can be given to a scan
/// running on another thread and the other kept to abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    stop: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Scans stop at their next step boundary.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Fail with [`SearchError::Cancelled`] if a flag is present and raised.
pub(crate) fn check(cancel: Option<&CancelFlag>) -> Result<(), SearchError> {
    match cancel {
        Some(flag) if flag.is_cancelled() => Err(SearchError::Cancelled),
        _ => Ok(()),
    }
}
