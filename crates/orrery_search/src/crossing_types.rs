//! Types for zero-crossing search.

use orrery_time::TimePoint;
use serde::Deserialize;

/// Default divisor applied to a synodic period to size scan steps.
pub const DEFAULT_STEP_DIVISOR: f64 = 16.0;

/// Default lower bound on scan steps in days.
pub const DEFAULT_STEP_FLOOR_DAYS: f64 = 1.0;

/// Synodic period assumed when a pair's periods give none (days).
pub const FALLBACK_SYNODIC_DAYS: f64 = 30.0;

/// A refined zero of a signed function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingEvent {
    pub time: TimePoint,
    /// Function value at `time`; `|residual| <= tolerance`.
    pub residual: f64,
}

/// Bracket refinement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefineMethod {
    /// Halve the bracket every iteration.
    #[default]
    Bisection,
    /// Regula falsi with the Illinois modification.
    Illinois,
}

/// Configuration for zero-crossing search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingConfig {
    /// Accept a root once `|g(root)|` is at most this.
    pub tolerance: f64,
    /// Refinement budget per bracket.
    pub max_iterations: u32,
    /// Roots closer than this to an accepted root are duplicates (days).
    pub dedup_window_days: f64,
    pub method: RefineMethod,
    /// Reject sign changes whose endpoint values differ by more than this.
    /// A wrapped angle jumping from +179 to -179 changes sign without a zero.
    pub max_bracket_jump: Option<f64>,
}

impl CrossingConfig {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            max_iterations: 60,
            dedup_window_days: 0.1,
            method: RefineMethod::Bisection,
            max_bracket_jump: None,
        }
    }

    /// Preset for wrapped aspect offsets in degrees: 1e-4 degree tolerance
    /// and a 270 degree wrap guard.
    pub fn aspect() -> Self {
        Self {
            max_bracket_jump: Some(270.0),
            ..Self::new(1e-4)
        }
    }

    pub fn with_method(mut self, method: RefineMethod) -> Self {
        self.method = method;
        self
    }

    /// Validate the configuration.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err("tolerance must be positive");
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0");
        }
        if !self.dedup_window_days.is_finite() || self.dedup_window_days < 0.0 {
            return Err("dedup_window_days must be non-negative");
        }
        if let Some(jump) = self.max_bracket_jump {
            if !jump.is_finite() || jump <= 0.0 {
                return Err("max_bracket_jump must be positive");
            }
        }
        Ok(())
    }
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

/// Synodic period of two bodies with orbital periods `p1` and `p2` (days).
///
/// Returns `None` for equal or non-positive periods.
pub fn synodic_period_days(p1: f64, p2: f64) -> Option<f64> {
    if !(p1.is_finite() && p2.is_finite()) || p1 <= 0.0 || p2 <= 0.0 {
        return None;
    }
    let rate = 1.0 / p1 - 1.0 / p2;
    if rate == 0.0 {
        return None;
    }
    let period = (1.0 / rate).abs();
    period.is_finite().then_some(period)
}

/// Derives the scan step for a crossing search.
///
/// The step should be short enough that at most one crossing falls inside
/// it. This is a heuristic: functions oscillating faster than the step
/// can lose crossings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSizer {
    Fixed {
        days: f64,
    },
    /// `max(floor_days, period_days / divisor)`.
    Synodic {
        period_days: f64,
        divisor: f64,
        floor_days: f64,
    },
}

impl StepSizer {
    pub fn fixed(days: f64) -> Self {
        Self::Fixed { days }
    }

    pub fn synodic(period_days: f64, divisor: f64, floor_days: f64) -> Self {
        Self::Synodic {
            period_days,
            divisor,
            floor_days,
        }
    }

    /// Step for a body pair from their orbital periods, using
    /// `fallback_days` when no synodic period exists.
    pub fn for_pair(p1: f64, p2: f64, divisor: f64, floor_days: f64, fallback_days: f64) -> Self {
        let period_days = synodic_period_days(p1, p2).unwrap_or(fallback_days);
        Self::synodic(period_days, divisor, floor_days)
    }

    /// Step length in days.
    pub fn step_days(&self) -> f64 {
        match *self {
            Self::Fixed { days } => days,
            Self::Synodic {
                period_days,
                divisor,
                floor_days,
            } => floor_days.max(period_days / divisor),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if let Self::Synodic {
            period_days,
            divisor,
            floor_days,
        } = *self
        {
            if !period_days.is_finite() || period_days <= 0.0 {
                return Err("period_days must be positive");
            }
            if !divisor.is_finite() || divisor <= 0.0 {
                return Err("step divisor must be positive");
            }
            if !floor_days.is_finite() || floor_days < 0.0 {
                return Err("step floor must be non-negative");
            }
        }
        let step = self.step_days();
        if !step.is_finite() || step <= 0.0 {
            return Err("step must be positive");
        }
        Ok(())
    }
}
