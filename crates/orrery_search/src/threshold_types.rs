//! Types for threshold-interval scanning.

use orrery_time::{TimePoint, minutes_to_days};

/// A window during which a non-negative function stayed at or below a threshold.
///
/// Boundaries are sample times, accurate to one scan step. `end` is the last
/// sample inside the threshold, or the scan end if the window was still open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEvent {
    pub start: TimePoint,
    /// Time of the smallest sampled value (refined if peak refinement is on).
    pub peak: TimePoint,
    pub end: TimePoint,
    /// Smallest value in `[start, end]`.
    pub extreme_value: f64,
}

impl IntervalEvent {
    /// Length of the window in days.
    pub fn duration_days(&self) -> f64 {
        self.end - self.start
    }
}

/// Scan output together with sampling statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub events: Vec<IntervalEvent>,
    /// Grid points visited.
    pub samples: u64,
    /// Grid points whose oracle evaluation failed and were skipped.
    pub skipped: u64,
}

/// An interval found for one target of a multi-target survey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInterval {
    /// Index into the surveyed target slice.
    pub target: usize,
    pub event: IntervalEvent,
}

/// Configuration for threshold-interval scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    /// Sampling step in days.
    pub step_days: f64,
    /// Inclusive upper bound for "inside" samples.
    pub threshold: f64,
    /// Fit a parabola through the minimum sample and its grid neighbours.
    pub refine_peak: bool,
}

impl ScanConfig {
    pub fn new(step_days: f64, threshold: f64) -> Self {
        Self {
            step_days,
            threshold,
            refine_peak: false,
        }
    }

    /// Step given in minutes.
    pub fn minutes(step_minutes: f64, threshold: f64) -> Self {
        Self::new(minutes_to_days(step_minutes), threshold)
    }

    /// Occultation defaults: one-minute step, 0.25 degree separation.
    pub fn occultation() -> Self {
        Self::minutes(1.0, 0.25)
    }

    pub fn with_peak_refinement(mut self) -> Self {
        self.refine_peak = true;
        self
    }

    /// Validate the configuration.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.step_days.is_finite() || self.step_days <= 0.0 {
            return Err("step_days must be positive");
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err("threshold must be positive");
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::occultation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occultation_defaults() {
        let c = ScanConfig::occultation();
        assert!((c.step_days * 1440.0 - 1.0).abs() < 1e-12);
        assert!((c.threshold - 0.25).abs() < 1e-12);
        assert!(!c.refine_peak);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_zero_step() {
        assert!(ScanConfig::new(0.0, 1.0).validate().is_err());
    }

    #[test]
    fn rejects_nan_step() {
        assert!(ScanConfig::new(f64::NAN, 1.0).validate().is_err());
    }

    #[test]
    fn rejects_non_positive_threshold() {
        assert!(ScanConfig::new(1.0, 0.0).validate().is_err());
        assert!(ScanConfig::new(1.0, -0.5).validate().is_err());
    }

    #[test]
    fn duration() {
        let ev = IntervalEvent {
            start: TimePoint::new(10.0),
            peak: TimePoint::new(10.5),
            end: TimePoint::new(11.25),
            extreme_value: 0.1,
        };
        assert!((ev.duration_days() - 1.25).abs() < 1e-12);
    }
}
