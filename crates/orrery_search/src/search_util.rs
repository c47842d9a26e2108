//! Shared numeric helpers: sampling grids and bracket refinement.

use orrery_time::TimePoint;

use crate::crossing_types::RefineMethod;
use crate::error::OracleResult;

/// Upper bound on samples a single scan may request.
pub(crate) const MAX_SAMPLES: u64 = 50_000_000;

/// Relative slack so that `span / step` landing a hair below an integer
/// still counts the final grid point.
const GRID_SLACK: f64 = 1e-9;

/// Number of whole steps from `t0` to `t1`, or `None` if over [`MAX_SAMPLES`].
pub(crate) fn grid_steps(t0: TimePoint, t1: TimePoint, step_days: f64) -> Option<u64> {
    let steps = ((t1 - t0) / step_days + GRID_SLACK).floor();
    if steps >= MAX_SAMPLES as f64 {
        None
    } else {
        Some(steps as u64)
    }
}

/// Time of grid point `i`.
pub(crate) fn grid_point(t0: TimePoint, step_days: f64, i: u64) -> TimePoint {
    t0 + step_days * i as f64
}

/// Outcome of refining one bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Refined {
    /// Converged: `|value| <= tolerance` at `time`.
    Root { time: TimePoint, value: f64 },
    /// Budget exhausted or the bracket collapsed without converging.
    Exhausted,
    /// The function could not be evaluated inside the bracket.
    SampleFailed,
}

/// Refine a sign-change bracket `[t_a, t_b]` of `g` until `|g| <= tolerance`.
///
/// The left endpoint is accepted directly when it already meets the
/// tolerance; the right endpoint never is, so that a root on a shared step
/// boundary is reported by the bracket that starts there.
#[allow(clippy::too_many_arguments)]
pub(crate) fn refine_bracket<G>(
    g: &mut G,
    mut t_a: TimePoint,
    mut g_a: f64,
    mut t_b: TimePoint,
    mut g_b: f64,
    tolerance: f64,
    max_iterations: u32,
    method: RefineMethod,
) -> Refined
where
    G: FnMut(TimePoint) -> OracleResult<f64>,
{
    if g_a.abs() <= tolerance {
        return Refined::Root {
            time: t_a,
            value: g_a,
        };
    }

    // Illinois: which endpoint was retained on the previous step.
    let mut retained: i8 = 0;

    for _ in 0..max_iterations {
        let t_mid = match method {
            RefineMethod::Bisection => TimePoint::new(0.5 * (t_a.jd() + t_b.jd())),
            RefineMethod::Illinois => {
                let denom = g_b - g_a;
                let candidate = if denom != 0.0 {
                    t_a.jd() - g_a * (t_b - t_a) / denom
                } else {
                    f64::NAN
                };
                if candidate.is_finite() && candidate > t_a.jd() && candidate < t_b.jd() {
                    TimePoint::new(candidate)
                } else {
                    TimePoint::new(0.5 * (t_a.jd() + t_b.jd()))
                }
            }
        };

        if t_mid <= t_a || t_mid >= t_b {
            return Refined::Exhausted;
        }

        let g_mid = match g(t_mid) {
            Ok(v) if v.is_finite() => v,
            _ => return Refined::SampleFailed,
        };

        if g_mid.abs() <= tolerance {
            return Refined::Root {
                time: t_mid,
                value: g_mid,
            };
        }

        if g_a * g_mid < 0.0 {
            t_b = t_mid;
            g_b = g_mid;
            if method == RefineMethod::Illinois && retained == -1 {
                g_a *= 0.5;
            }
            retained = -1;
        } else {
            t_a = t_mid;
            g_a = g_mid;
            if method == RefineMethod::Illinois && retained == 1 {
                g_b *= 0.5;
            }
            retained = 1;
        }
    }

    Refined::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;

    fn tp(jd: f64) -> TimePoint {
        TimePoint::new(jd)
    }

    #[test]
    fn grid_counts_exact_multiple() {
        let t0 = tp(0.0);
        let t1 = tp(1.0);
        assert_eq!(grid_steps(t0, t1, 1.0 / 1440.0), Some(1440));
        assert_eq!(grid_steps(t0, t1, 0.3), Some(3));
    }

    #[test]
    fn grid_rejects_huge_scan() {
        assert_eq!(grid_steps(tp(0.0), tp(1e6), 1e-6), None);
    }

    #[test]
    fn bisection_linear() {
        let mut g = |t: TimePoint| -> OracleResult<f64> { Ok(t.jd() - 3.3) };
        let r = refine_bracket(
            &mut g,
            tp(3.0),
            -0.3,
            tp(4.0),
            0.7,
            1e-9,
            80,
            RefineMethod::Bisection,
        );
        match r {
            Refined::Root { time, value } => {
                assert!((time.jd() - 3.3).abs() < 1e-9);
                assert!(value.abs() <= 1e-9);
            }
            other => panic!("expected root, got {other:?}"),
        }
    }

    #[test]
    fn illinois_cubic() {
        let mut g = |t: TimePoint| -> OracleResult<f64> { Ok(t.jd().powi(3) - 2.0) };
        let r = refine_bracket(
            &mut g,
            tp(1.0),
            -1.0,
            tp(2.0),
            6.0,
            1e-12,
            60,
            RefineMethod::Illinois,
        );
        match r {
            Refined::Root { time, .. } => assert!((time.jd() - 2f64.cbrt()).abs() < 1e-10),
            other => panic!("expected root, got {other:?}"),
        }
    }

    #[test]
    fn left_endpoint_root_short_circuits() {
        let mut calls = 0;
        let mut g = |_t: TimePoint| -> OracleResult<f64> {
            calls += 1;
            Ok(1.0)
        };
        let r = refine_bracket(
            &mut g,
            tp(5.0),
            0.0,
            tp(6.0),
            1.0,
            1e-6,
            10,
            RefineMethod::Bisection,
        );
        assert_eq!(
            r,
            Refined::Root {
                time: tp(5.0),
                value: 0.0
            }
        );
        assert_eq!(calls, 0);
    }

    #[test]
    fn budget_exhausted() {
        let mut g = |t: TimePoint| -> OracleResult<f64> { Ok(t.jd() - 0.123_456_789) };
        let r = refine_bracket(
            &mut g,
            tp(0.0),
            -0.123_456_789,
            tp(1.0),
            0.876_543_211,
            1e-12,
            3,
            RefineMethod::Bisection,
        );
        assert_eq!(r, Refined::Exhausted);
    }

    #[test]
    fn discontinuity_never_converges() {
        // Step from -1 to +1 at t = 0.5: sign change without a root.
        let mut g = |t: TimePoint| -> OracleResult<f64> { Ok(if t.jd() < 0.5 { -1.0 } else { 1.0 }) };
        let r = refine_bracket(
            &mut g,
            tp(0.0),
            -1.0,
            tp(1.0),
            1.0,
            1e-3,
            200,
            RefineMethod::Bisection,
        );
        assert_eq!(r, Refined::Exhausted);
    }

    #[test]
    fn failed_sample_inside_bracket() {
        let mut g = |_t: TimePoint| -> OracleResult<f64> { Err(OracleError::new("no data")) };
        let r = refine_bracket(
            &mut g,
            tp(0.0),
            -1.0,
            tp(1.0),
            1.0,
            1e-3,
            10,
            RefineMethod::Bisection,
        );
        assert_eq!(r, Refined::SampleFailed);
    }
}
