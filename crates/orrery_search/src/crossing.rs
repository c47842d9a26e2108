//! Zero-crossing search over signed (typically wrapped-angle) functions.
//!
//! Coarse scan at step boundaries for sign changes, then refine each bracket
//! until the residual is within tolerance. Used for aspect calendars:
//! g(t) = normalize(lon_a(t) - lon_b(t) - target) crosses zero at the
//! exact aspect.
//!
//! Candidates whose refinement does not converge are dropped, not reported.

use orrery_time::TimePoint;
use tracing::{debug, instrument, trace};

use crate::cancel::{self, CancelFlag};
use crate::crossing_types::{CrossingConfig, CrossingEvent, StepSizer};
use crate::error::{OracleResult, SearchError};
use crate::search_util::{Refined, grid_point, grid_steps, refine_bracket};

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Whether two consecutive samples bracket a zero.
///
/// `sign(a) * sign(b) <= 0`, unless the jump between them exceeds `guard`,
/// which marks a wrap-around discontinuity of an angle rather than a zero.
fn is_bracket(g_a: f64, g_b: f64, guard: Option<f64>) -> bool {
    if sign(g_a) * sign(g_b) > 0 {
        return false;
    }
    match guard {
        Some(jump) => (g_a - g_b).abs() <= jump,
        None => true,
    }
}

fn validate_range(t0: TimePoint, t1: TimePoint) -> Result<(), SearchError> {
    if !t0.is_finite() || !t1.is_finite() {
        return Err(SearchError::InvalidConfig("search bounds must be finite"));
    }
    if t1 <= t0 {
        return Err(SearchError::InvalidConfig("t1 must be after t0"));
    }
    Ok(())
}

/// Validate everything a crossing search needs before it samples.
pub(crate) fn validate_search(
    t0: TimePoint,
    t1: TimePoint,
    step_sizer: &StepSizer,
    config: &CrossingConfig,
) -> Result<(), SearchError> {
    config.validate().map_err(SearchError::InvalidConfig)?;
    step_sizer.validate().map_err(SearchError::InvalidConfig)?;
    validate_range(t0, t1)
}

/// Scan and refine, assuming inputs were validated.
pub(crate) fn scan_crossings<G>(
    g: &mut G,
    t0: TimePoint,
    t1: TimePoint,
    step_days: f64,
    config: &CrossingConfig,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<CrossingEvent>, SearchError>
where
    G: FnMut(TimePoint) -> OracleResult<f64>,
{
    let steps = grid_steps(t0, t1, step_days)
        .ok_or(SearchError::InvalidConfig("search requires too many steps"))?;

    let mut accepted: Vec<CrossingEvent> = Vec::new();
    let mut prev: Option<(TimePoint, f64)> = None;

    for i in 0..=steps + 1 {
        cancel::check(cancel)?;
        let t = grid_point(t0, step_days, i).min(t1);
        let is_last = t >= t1;

        let v = match g(t) {
            Ok(v) if v.is_finite() => v,
            Ok(v) => {
                debug!(%t, value = v, "skipping non-finite boundary sample");
                if is_last {
                    break;
                }
                continue;
            }
            Err(e) => {
                debug!(%t, error = %e, "skipping failed boundary sample");
                if is_last {
                    break;
                }
                continue;
            }
        };

        if let Some((t_a, g_a)) = prev {
            if is_bracket(g_a, v, config.max_bracket_jump) {
                trace!(%t_a, t_b = %t, g_a, g_b = v, "bracket found");
                let refined = refine_bracket(
                    g,
                    t_a,
                    g_a,
                    t,
                    v,
                    config.tolerance,
                    config.max_iterations,
                    config.method,
                );
                match refined {
                    Refined::Root { time, value } => {
                        let in_window = time >= t_a && (time < t || (is_last && time <= t));
                        if !in_window {
                            trace!(%time, "root outside its step window");
                        } else if accepted
                            .iter()
                            .any(|e| (e.time - time).abs() < config.dedup_window_days)
                        {
                            debug!(%time, "duplicate crossing rejected");
                        } else {
                            accepted.push(CrossingEvent {
                                time,
                                residual: value,
                            });
                        }
                    }
                    Refined::Exhausted => {
                        debug!(%t_a, t_b = %t, "dropping candidate: refinement did not converge");
                    }
                    Refined::SampleFailed => {
                        debug!(%t_a, t_b = %t, "dropping candidate: sample failed during refinement");
                    }
                }
            }
        }

        prev = Some((t, v));
        if is_last {
            break;
        }
    }

    Ok(accepted)
}

#[allow(clippy::too_many_arguments)]
fn find_inner<C, G, P>(
    context: &C,
    mut g: G,
    t0: TimePoint,
    t1: TimePoint,
    step_sizer: &StepSizer,
    config: &CrossingConfig,
    skip: P,
    cancel: Option<&CancelFlag>,
) -> Result<Vec<CrossingEvent>, SearchError>
where
    G: FnMut(&C, TimePoint) -> OracleResult<f64>,
    P: FnOnce(&C) -> bool,
{
    validate_search(t0, t1, step_sizer, config)?;
    if skip(context) {
        debug!("context excluded by skip predicate");
        return Ok(Vec::new());
    }
    let mut at = |t: TimePoint| g(context, t);
    scan_crossings(&mut at, t0, t1, step_sizer.step_days(), config, cancel)
}

/// Find every zero crossing of `g(context, t)` in `[t0, t1]`.
///
/// `skip` is consulted once, after validation; when it returns `true` the
/// search yields no crossings and `g` is never called.
#[instrument(skip_all, fields(t0 = %t0, t1 = %t1, step = step_sizer.step_days()))]
pub fn find_zero_crossings<C, G, P>(
    context: &C,
    g: G,
    t0: TimePoint,
    t1: TimePoint,
    step_sizer: &StepSizer,
    config: &CrossingConfig,
    skip: P,
) -> Result<Vec<CrossingEvent>, SearchError>
where
    G: FnMut(&C, TimePoint) -> OracleResult<f64>,
    P: FnOnce(&C) -> bool,
{
    find_inner(context, g, t0, t1, step_sizer, config, skip, None)
}

/// Like [`find_zero_crossings`], checking `cancel` once per step.
#[allow(clippy::too_many_arguments)]
#[instrument(skip_all, fields(t0 = %t0, t1 = %t1, step = step_sizer.step_days()))]
pub fn find_zero_crossings_cancellable<C, G, P>(
    context: &C,
    g: G,
    t0: TimePoint,
    t1: TimePoint,
    step_sizer: &StepSizer,
    config: &CrossingConfig,
    skip: P,
    cancel: &CancelFlag,
) -> Result<Vec<CrossingEvent>, SearchError>
where
    G: FnMut(&C, TimePoint) -> OracleResult<f64>,
    P: FnOnce(&C) -> bool,
{
    find_inner(context, g, t0, t1, step_sizer, config, skip, Some(cancel))
}
