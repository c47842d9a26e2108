//! Threshold-interval scanner.
//!
//! Walks a fixed sampling grid over `[t0, t1]` and reports every window in
//! which a non-negative function (typically an angular separation) stays at
//! or below a threshold. Used for occultation and close-approach detection.
//!
//! The scanner samples; it does not interpolate boundaries. Start, end and
//! peak are grid times and therefore accurate to one step. Optional parabolic
//! refinement only moves the peak.

use orrery_time::TimePoint;
use tracing::{debug, instrument, trace, warn};

use crate::cancel::{self, CancelFlag};
use crate::error::{OracleResult, SearchError};
use crate::parallel::run_units;
use crate::search_util::{grid_point, grid_steps};
use crate::threshold_types::{IntervalEvent, ScanConfig, ScanReport, TargetInterval};

/// Fraction of a step within which two times count as the same grid point.
const GRID_MATCH: f64 = 1e-6;

/// A window that has been entered but not yet left.
#[derive(Debug, Clone, Copy)]
struct OpenInterval {
    start: TimePoint,
    last_inside: TimePoint,
    min_t: TimePoint,
    min_v: f64,
    /// Sample one step before `min_t`, if it was evaluated.
    before: Option<f64>,
    /// Sample one step after `min_t`, if it was evaluated.
    after: Option<f64>,
}

/// Inside/outside state machine fed one successful sample at a time.
#[derive(Debug)]
struct IntervalTracker {
    threshold: f64,
    step_days: f64,
    refine_peak: bool,
    open: Option<OpenInterval>,
    prev: Option<(TimePoint, f64)>,
}

impl IntervalTracker {
    fn new(config: &ScanConfig) -> Self {
        Self {
            threshold: config.threshold,
            step_days: config.step_days,
            refine_peak: config.refine_peak,
            open: None,
            prev: None,
        }
    }

    fn is_step_apart(&self, earlier: TimePoint, later: TimePoint) -> bool {
        ((later - earlier) - self.step_days).abs() <= self.step_days * GRID_MATCH
    }

    /// Feed one sample; returns an interval when this sample closes one.
    fn observe(&mut self, t: TimePoint, v: f64) -> Option<IntervalEvent> {
        let prev = self.prev.replace((t, v));
        let before = prev
            .filter(|&(pt, _)| self.is_step_apart(pt, t))
            .map(|(_, pv)| pv);

        if let Some(mut iv) = self.open.take() {
            if iv.after.is_none() && self.is_step_apart(iv.min_t, t) {
                iv.after = Some(v);
            }
            if v <= self.threshold {
                if v < iv.min_v {
                    iv.min_v = v;
                    iv.min_t = t;
                    iv.before = before;
                    iv.after = None;
                }
                iv.last_inside = t;
                self.open = Some(iv);
                None
            } else {
                let end = iv.last_inside;
                trace!(start = %iv.start, end = %end, min = iv.min_v, "interval closed");
                Some(self.close(iv, end))
            }
        } else {
            if v <= self.threshold {
                trace!(start = %t, value = v, "interval opened");
                self.open = Some(OpenInterval {
                    start: t,
                    last_inside: t,
                    min_t: t,
                    min_v: v,
                    before,
                    after: None,
                });
            }
            None
        }
    }

    /// Close a window still open at the end of the scan, truncated at `t1`.
    fn finish(&mut self, t1: TimePoint) -> Option<IntervalEvent> {
        let iv = self.open.take()?;
        trace!(start = %iv.start, "interval truncated at scan end");
        Some(self.close(iv, t1))
    }

    fn close(&self, iv: OpenInterval, end: TimePoint) -> IntervalEvent {
        let (peak, extreme_value) = match (self.refine_peak, iv.before, iv.after) {
            (true, Some(y0), Some(y2)) => {
                parabolic_vertex(y0, iv.min_v, y2, iv.min_t, self.step_days, iv.start, end)
            }
            _ => (iv.min_t, iv.min_v),
        };
        IntervalEvent {
            start: iv.start,
            peak,
            end,
            extreme_value,
        }
    }
}

/// Vertex of the parabola through `(-h, y0)`, `(0, y1)`, `(h, y2)` around `center`.
///
/// Falls back to the raw sample when the parabola does not open upward.
fn parabolic_vertex(
    y0: f64,
    y1: f64,
    y2: f64,
    center: TimePoint,
    step_days: f64,
    lo: TimePoint,
    hi: TimePoint,
) -> (TimePoint, f64) {
    let curvature = y0 - 2.0 * y1 + y2;
    if curvature.is_nan() || curvature <= 0.0 {
        return (center, y1);
    }
    let x = (0.5 * (y0 - y2) / curvature).clamp(-1.0, 1.0);
    let value = (y1 - 0.25 * (y0 - y2) * x).min(y1);
    let peak = (center + x * step_days).clamp(lo, hi);
    (peak, value)
}

fn validate_range(t0: TimePoint, t1: TimePoint) -> Result<(), SearchError> {
    if !t0.is_finite() || !t1.is_finite() {
        return Err(SearchError::InvalidConfig("scan bounds must be finite"));
    }
    if t1 <= t0 {
        return Err(SearchError::InvalidConfig("t1 must be after t0"));
    }
    Ok(())
}

fn scan_inner<F>(
    mut f: F,
    t0: TimePoint,
    t1: TimePoint,
    config: &ScanConfig,
    cancel: Option<&CancelFlag>,
) -> Result<ScanReport, SearchError>
where
    F: FnMut(TimePoint) -> OracleResult<f64>,
{
    config.validate().map_err(SearchError::InvalidConfig)?;
    validate_range(t0, t1)?;
    let steps = grid_steps(t0, t1, config.step_days)
        .ok_or(SearchError::InvalidConfig("scan requires too many samples"))?;

    let mut tracker = IntervalTracker::new(config);
    let mut events = Vec::new();
    let mut skipped = 0u64;

    for i in 0..=steps {
        cancel::check(cancel)?;
        let t = grid_point(t0, config.step_days, i).min(t1);
        match f(t) {
            Ok(v) if !v.is_nan() => {
                if let Some(event) = tracker.observe(t, v) {
                    events.push(event);
                }
            }
            Ok(_) => {
                skipped += 1;
                debug!(%t, "skipping NaN sample");
            }
            Err(e) => {
                skipped += 1;
                debug!(%t, error = %e, "skipping failed sample");
            }
        }
    }

    if let Some(event) = tracker.finish(t1) {
        events.push(event);
    }

    if skipped > 0 {
        warn!(skipped, samples = steps + 1, "threshold scan skipped samples");
    }

    Ok(ScanReport {
        events,
        samples: steps + 1,
        skipped,
    })
}

/// Scan `f` over `[t0, t1]` and return every below-threshold interval.
///
/// Failed samples are skipped without disturbing the inside/outside state.
#[instrument(skip_all, fields(t0 = %t0, t1 = %t1, step = config.step_days, threshold = config.threshold))]
pub fn scan_threshold_intervals<F>(
    f: F,
    t0: TimePoint,
    t1: TimePoint,
    config: &ScanConfig,
) -> Result<Vec<IntervalEvent>, SearchError>
where
    F: FnMut(TimePoint) -> OracleResult<f64>,
{
    scan_inner(f, t0, t1, config, None).map(|r| r.events)
}

/// Like [`scan_threshold_intervals`], also reporting sample counts.
#[instrument(skip_all, fields(t0 = %t0, t1 = %t1, step = config.step_days, threshold = config.threshold))]
pub fn scan_threshold_intervals_report<F>(
    f: F,
    t0: TimePoint,
    t1: TimePoint,
    config: &ScanConfig,
) -> Result<ScanReport, SearchError>
where
    F: FnMut(TimePoint) -> OracleResult<f64>,
{
    scan_inner(f, t0, t1, config, None)
}

/// Like [`scan_threshold_intervals`], checking `cancel` before every sample.
#[instrument(skip_all, fields(t0 = %t0, t1 = %t1, step = config.step_days, threshold = config.threshold))]
pub fn scan_threshold_intervals_cancellable<F>(
    f: F,
    t0: TimePoint,
    t1: TimePoint,
    config: &ScanConfig,
    cancel: &CancelFlag,
) -> Result<Vec<IntervalEvent>, SearchError>
where
    F: FnMut(TimePoint) -> OracleResult<f64>,
{
    scan_inner(f, t0, t1, config, Some(cancel)).map(|r| r.events)
}

/// Scan one function per target (e.g. Moon-to-star separation for a star
/// list), spreading targets over `workers` threads.
///
/// Results are ordered by target index, then by time.
#[instrument(skip_all, fields(targets = targets.len(), workers = workers))]
pub fn scan_targets<T, F>(
    targets: &[T],
    f: F,
    t0: TimePoint,
    t1: TimePoint,
    config: &ScanConfig,
    workers: usize,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<TargetInterval>, SearchError>
where
    T: Sync,
    F: Fn(&T, TimePoint) -> OracleResult<f64> + Sync,
{
    config.validate().map_err(SearchError::InvalidConfig)?;
    validate_range(t0, t1)?;

    let indices: Vec<usize> = (0..targets.len()).collect();
    run_units(&indices, workers, |&index| {
        let target = &targets[index];
        let report = scan_inner(|t| f(target, t), t0, t1, config, cancel)?;
        Ok(report
            .events
            .into_iter()
            .map(|event| TargetInterval {
                target: index,
                event,
            })
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;

    fn tp(jd: f64) -> TimePoint {
        TimePoint::new(jd)
    }

    /// Sampled values on a unit grid starting at 0.
    fn table(values: &'static [f64]) -> impl FnMut(TimePoint) -> OracleResult<f64> {
        move |t| {
            let i = t.jd().round() as usize;
            Ok(values.get(i).copied().unwrap_or(10.0))
        }
    }

    #[test]
    fn two_separate_windows() {
        let f = table(&[5.0, 0.5, 0.2, 5.0, 5.0, 0.9, 5.0]);
        let events = scan_threshold_intervals(f, tp(0.0), tp(6.0), &ScanConfig::new(1.0, 1.0))
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start, tp(1.0));
        assert_eq!(events[0].peak, tp(2.0));
        assert_eq!(events[0].end, tp(2.0));
        assert_eq!(events[1].start, tp(5.0));
        assert_eq!(events[1].end, tp(5.0));
        assert!((events[1].extreme_value - 0.9).abs() < 1e-12);
    }

    #[test]
    fn first_minimum_wins_ties() {
        let f = table(&[0.3, 0.1, 0.1, 0.4, 5.0]);
        let events = scan_threshold_intervals(f, tp(0.0), tp(4.0), &ScanConfig::new(1.0, 1.0))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].peak, tp(1.0));
        assert_eq!(events[0].start, tp(0.0));
        assert_eq!(events[0].end, tp(3.0));
    }

    #[test]
    fn truncated_window_ends_at_t1() {
        let f = table(&[5.0, 5.0, 0.5, 0.4, 0.3]);
        let events = scan_threshold_intervals(f, tp(0.0), tp(4.5), &ScanConfig::new(1.0, 1.0))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, tp(2.0));
        assert_eq!(events[0].end, tp(4.5));
        assert_eq!(events[0].peak, tp(4.0));
    }

    #[test]
    fn failed_samples_do_not_split_window() {
        let f = |t: TimePoint| -> OracleResult<f64> {
            match t.jd().round() as i64 {
                2 | 3 => Err(OracleError::new("below horizon")),
                1..=4 => Ok(0.5),
                _ => Ok(5.0),
            }
        };
        let report =
            scan_threshold_intervals_report(f, tp(0.0), tp(6.0), &ScanConfig::new(1.0, 1.0))
                .unwrap();
        assert_eq!(report.samples, 7);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].start, tp(1.0));
        assert_eq!(report.events[0].end, tp(4.0));
    }

    #[test]
    fn failed_sample_before_exit_keeps_last_inside_end() {
        let f = |t: TimePoint| -> OracleResult<f64> {
            match t.jd().round() as i64 {
                3 => Err(OracleError::new("gap")),
                1 | 2 => Ok(0.5),
                _ => Ok(5.0),
            }
        };
        let events = scan_threshold_intervals(f, tp(0.0), tp(6.0), &ScanConfig::new(1.0, 1.0))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end, tp(2.0));
    }

    #[test]
    fn nan_counts_as_skipped() {
        let f = |t: TimePoint| -> OracleResult<f64> {
            if t.jd().round() as i64 == 1 {
                Ok(f64::NAN)
            } else {
                Ok(5.0)
            }
        };
        let report =
            scan_threshold_intervals_report(f, tp(0.0), tp(3.0), &ScanConfig::new(1.0, 1.0))
                .unwrap();
        assert_eq!(report.skipped, 1);
        assert!(report.events.is_empty());
    }

    #[test]
    fn parabolic_refinement_finds_true_minimum() {
        // |t - 2.3| sampled on a unit grid; parabola through 1, 2, 3.
        let f = |t: TimePoint| -> OracleResult<f64> { Ok((t.jd() - 2.3).powi(2)) };
        let config = ScanConfig::new(1.0, 2.0).with_peak_refinement();
        let events = scan_threshold_intervals(f, tp(0.0), tp(6.0), &config).unwrap();
        assert_eq!(events.len(), 1);
        let ev = events[0];
        assert!((ev.peak.jd() - 2.3).abs() < 1e-9, "peak = {}", ev.peak);
        assert!(ev.extreme_value.abs() < 1e-9);
        assert!(ev.start <= ev.peak && ev.peak <= ev.end);
    }

    #[test]
    fn refinement_skipped_without_neighbours() {
        let f = table(&[0.2, 0.5, 5.0]);
        let config = ScanConfig::new(1.0, 1.0).with_peak_refinement();
        let events = scan_threshold_intervals(f, tp(0.0), tp(2.0), &config).unwrap();
        assert_eq!(events[0].peak, tp(0.0));
        assert!((events[0].extreme_value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn parabola_opening_downward_keeps_sample() {
        let (peak, value) =
            parabolic_vertex(0.5, 0.5, 0.5, tp(3.0), 1.0, tp(2.0), tp(4.0));
        assert_eq!(peak, tp(3.0));
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cancelled_before_first_sample() {
        let flag = CancelFlag::new();
        flag.cancel();
        let err = scan_threshold_intervals_cancellable(
            |_t| Ok(0.0),
            tp(0.0),
            tp(1.0),
            &ScanConfig::new(0.1, 1.0),
            &flag,
        )
        .unwrap_err();
        assert_eq!(err, SearchError::Cancelled);
    }

    #[test]
    fn invalid_range_fails_before_sampling() {
        let mut calls = 0;
        let err = scan_threshold_intervals(
            |_t| {
                calls += 1;
                Ok(0.0)
            },
            tp(5.0),
            tp(5.0),
            &ScanConfig::new(1.0, 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn oversized_grid_rejected() {
        let err = scan_threshold_intervals(
            |_t| Ok(0.0),
            tp(0.0),
            tp(1e6),
            &ScanConfig::new(1e-6, 1.0),
        )
        .unwrap_err();
        assert_eq!(err, SearchError::InvalidConfig("scan requires too many samples"));
    }
}
