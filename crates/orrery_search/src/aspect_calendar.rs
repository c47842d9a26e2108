//! Aspect calendar: every exact aspect between catalogued bodies in a window.
//!
//! Each (pair, aspect, signed target) is an independent search unit. Units
//! are searched with the zero-crossing engine, optionally across worker
//! threads, and the merged results pass through a [`DedupLedger`] keyed by
//! aspect name and pair before being sorted by time.

use orrery_time::TimePoint;
use tracing::{debug, instrument};

use crate::aspect::{Aspect, MAJOR_ASPECTS, aspect_offset};
use crate::cancel::{self, CancelFlag};
use crate::crossing::{scan_crossings, validate_search};
use crate::crossing_types::{
    CrossingConfig, CrossingEvent, DEFAULT_STEP_DIVISOR, DEFAULT_STEP_FLOOR_DAYS,
    FALLBACK_SYNODIC_DAYS, StepSizer,
};
use crate::dedup::DedupLedger;
use crate::error::{OracleResult, SearchError};
use crate::parallel::run_units;
use crate::settings::BodySpec;

/// One independent search: a body pair, an aspect and one of its targets.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectUnit {
    pub body_a: String,
    pub body_b: String,
    pub aspect: Aspect,
    /// Signed longitude difference `lon_a - lon_b` searched for.
    pub target_deg: f64,
    pub step: StepSizer,
}

impl AspectUnit {
    /// Residual crossing zero when the aspect is exact.
    pub fn residual(&self, lon_a: f64, lon_b: f64) -> f64 {
        aspect_offset(lon_a, lon_b, self.target_deg)
    }

    /// `"A-B"`, the subject used for duplicate suppression.
    pub fn pair(&self) -> String {
        format!("{}-{}", self.body_a, self.body_b)
    }

    /// Whether either body of the pair is one of `names`.
    pub fn involves_any(&self, names: &[&str]) -> bool {
        names
            .iter()
            .any(|n| *n == self.body_a || *n == self.body_b)
    }
}

/// An exact aspect found by the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub time: TimePoint,
    /// Residual at `time` (degrees).
    pub residual: f64,
    pub unit: AspectUnit,
}

impl CalendarEntry {
    /// `"A aspect B"`.
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.unit.body_a, self.unit.aspect.name, self.unit.body_b
        )
    }
}

/// Drives aspect searches over every pair of catalogued bodies.
#[derive(Debug, Clone)]
pub struct AspectCalendar {
    bodies: Vec<BodySpec>,
    aspects: Vec<Aspect>,
    config: CrossingConfig,
    step_divisor: f64,
    step_floor_days: f64,
    fallback_synodic_days: f64,
}

impl AspectCalendar {
    /// Calendar over `bodies` for the major aspects with the aspect preset.
    pub fn new(bodies: Vec<BodySpec>) -> Self {
        Self {
            bodies,
            aspects: MAJOR_ASPECTS.to_vec(),
            config: CrossingConfig::aspect(),
            step_divisor: DEFAULT_STEP_DIVISOR,
            step_floor_days: DEFAULT_STEP_FLOOR_DAYS,
            fallback_synodic_days: FALLBACK_SYNODIC_DAYS,
        }
    }

    pub fn with_aspects(mut self, aspects: Vec<Aspect>) -> Self {
        self.aspects = aspects;
        self
    }

    pub fn with_config(mut self, config: CrossingConfig) -> Self {
        self.config = config;
        self
    }

    /// Step = `max(floor_days, synodic / divisor)`, with `fallback_days`
    /// standing in for an undefined synodic period.
    pub fn with_step_sizing(mut self, divisor: f64, floor_days: f64, fallback_days: f64) -> Self {
        self.step_divisor = divisor;
        self.step_floor_days = floor_days;
        self.fallback_synodic_days = fallback_days;
        self
    }

    pub fn config(&self) -> &CrossingConfig {
        &self.config
    }

    /// All search units, pairs in catalogue order.
    pub fn units(&self) -> Vec<AspectUnit> {
        let mut units = Vec::new();
        for (i, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[i + 1..] {
                let step = StepSizer::for_pair(
                    a.period_days,
                    b.period_days,
                    self.step_divisor,
                    self.step_floor_days,
                    self.fallback_synodic_days,
                );
                for aspect in &self.aspects {
                    for target_deg in aspect.targets() {
                        units.push(AspectUnit {
                            body_a: a.name.clone(),
                            body_b: b.name.clone(),
                            aspect: *aspect,
                            target_deg,
                            step,
                        });
                    }
                }
            }
        }
        units
    }

    fn validate(&self, t0: TimePoint, t1: TimePoint, units: &[AspectUnit]) -> Result<(), SearchError> {
        if !self.fallback_synodic_days.is_finite() || self.fallback_synodic_days <= 0.0 {
            return Err(SearchError::InvalidConfig("fallback synodic period must be positive"));
        }
        if units.is_empty() {
            return validate_search(t0, t1, &StepSizer::fixed(1.0), &self.config);
        }
        units
            .iter()
            .try_for_each(|unit| validate_search(t0, t1, &unit.step, &self.config))
    }

    /// Search every unit in turn.
    ///
    /// `offset(unit, t)` returns the unit's residual at `t`, usually
    /// [`AspectUnit::residual`] of the two bodies' longitudes. Units for
    /// which `skip` returns `true` are never sampled. Detections already in
    /// `ledger` (e.g. from an overlapping earlier window) are not repeated.
    #[instrument(skip_all, fields(t0 = %t0, t1 = %t1))]
    pub fn build<F, S>(
        &self,
        t0: TimePoint,
        t1: TimePoint,
        mut offset: F,
        mut skip: S,
        ledger: &mut DedupLedger,
        cancel: Option<&CancelFlag>,
    ) -> Result<Vec<CalendarEntry>, SearchError>
    where
        F: FnMut(&AspectUnit, TimePoint) -> OracleResult<f64>,
        S: FnMut(&AspectUnit) -> bool,
    {
        let units = self.units();
        self.validate(t0, t1, &units)?;

        let mut found = Vec::new();
        for unit in &units {
            cancel::check(cancel)?;
            if skip(unit) {
                debug!(pair = %unit.pair(), aspect = unit.aspect.name, "unit skipped");
                continue;
            }
            let events = self.search_unit(unit, t0, t1, |t| offset(unit, t), cancel)?;
            found.extend(events.into_iter().map(|e| entry(unit, e)));
        }
        Ok(merge(found, ledger))
    }

    /// Like [`build`](Self::build), fanning units out over `workers` threads.
    ///
    /// Output is identical to the sequential build for the same inputs.
    #[instrument(skip_all, fields(t0 = %t0, t1 = %t1, workers = workers))]
    #[allow(clippy::too_many_arguments)]
    pub fn build_parallel<F, S>(
        &self,
        t0: TimePoint,
        t1: TimePoint,
        offset: F,
        skip: S,
        ledger: &mut DedupLedger,
        cancel: Option<&CancelFlag>,
        workers: usize,
    ) -> Result<Vec<CalendarEntry>, SearchError>
    where
        F: Fn(&AspectUnit, TimePoint) -> OracleResult<f64> + Sync,
        S: Fn(&AspectUnit) -> bool + Sync,
    {
        let units = self.units();
        self.validate(t0, t1, &units)?;

        let found = run_units(&units, workers, |unit| {
            if skip(unit) {
                return Ok(Vec::new());
            }
            let events = self.search_unit(unit, t0, t1, |t| offset(unit, t), cancel)?;
            Ok(events.into_iter().map(|e| entry(unit, e)).collect())
        })?;
        Ok(merge(found, ledger))
    }

    fn search_unit<G>(
        &self,
        unit: &AspectUnit,
        t0: TimePoint,
        t1: TimePoint,
        mut g: G,
        cancel: Option<&CancelFlag>,
    ) -> Result<Vec<CrossingEvent>, SearchError>
    where
        G: FnMut(TimePoint) -> OracleResult<f64>,
    {
        scan_crossings(&mut g, t0, t1, unit.step.step_days(), &self.config, cancel)
    }
}

fn entry(unit: &AspectUnit, event: CrossingEvent) -> CalendarEntry {
    CalendarEntry {
        time: event.time,
        residual: event.residual,
        unit: unit.clone(),
    }
}

/// Drop ledger duplicates in unit order, then sort by time.
fn merge(found: Vec<CalendarEntry>, ledger: &mut DedupLedger) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = found
        .into_iter()
        .filter(|e| {
            let admitted = ledger.admit(e.unit.aspect.name, &e.unit.pair(), e.time);
            if !admitted {
                debug!(time = %e.time, event = %e.label(), "duplicate aspect rejected");
            }
            admitted
        })
        .collect();
    entries.sort_by(|a, b| a.time.cmp(&b.time));
    entries
}
