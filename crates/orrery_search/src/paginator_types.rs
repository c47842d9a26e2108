//! Types for recurring-event pagination.

use std::collections::HashMap;

use orrery_time::TimePoint;
use serde::{Deserialize, Serialize};

/// Default cursor advance past a returned event (days).
///
/// Shorter than the minimum spacing of every [`EventCategory`].
pub const DEFAULT_ADVANCE_DAYS: f64 = 1.0;

/// An event with a position on the time line.
pub trait Timed {
    /// The instant the event is reported at.
    fn time(&self) -> TimePoint;

    /// The instant after which the next search may begin.
    ///
    /// Events with duration (transits) resume after their last contact.
    fn resume_after(&self) -> TimePoint {
        self.time()
    }
}

/// Pagination state: the instant the next search starts from.
///
/// This is the only state a paginator carries, so persisting it is enough
/// to resume later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventCursor {
    pub last_time: TimePoint,
}

/// Recurring phenomena served by a paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Apsis,
    Eclipse,
    Node,
    Quarter,
    Elongation,
    Transit,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Apsis,
        EventCategory::Eclipse,
        EventCategory::Node,
        EventCategory::Quarter,
        EventCategory::Elongation,
        EventCategory::Transit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Apsis => "apsis",
            Self::Eclipse => "eclipse",
            Self::Node => "node",
            Self::Quarter => "quarter",
            Self::Elongation => "elongation",
            Self::Transit => "transit",
        }
    }

    /// Lower bound on the spacing of consecutive events, in days.
    ///
    /// Floors sit below the shortest gaps tabulated in Meeus,
    /// *Astronomical Algorithms*:
    /// - lunar perigee to apogee varies around 13.8 days and can drop under
    ///   12, and planetary apsides are far slower;
    /// - lunar nodes alternate every ~13.6 days;
    /// - a solar and a lunar eclipse come at least ~14 days apart;
    /// - phase quarters are at least ~6.5 days apart;
    /// - Mercury's greatest elongations alternate no sooner than ~36 days;
    /// - transits of Mercury are years apart.
    pub fn min_spacing_days(self) -> f64 {
        match self {
            Self::Apsis => 11.0,
            Self::Eclipse => 13.0,
            Self::Node => 12.0,
            Self::Quarter => 6.0,
            Self::Elongation => 30.0,
            Self::Transit => 1000.0,
        }
    }
}

/// Pericenter or apocenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApsisKind {
    Pericenter,
    Apocenter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApsisEvent {
    pub time: TimePoint,
    pub kind: ApsisKind,
    /// Distance at the apsis, in the oracle's units (km for the Moon, AU for planets).
    pub distance: f64,
}

/// Which body is eclipsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EclipseBody {
    Lunar,
    Solar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EclipseKind {
    Penumbral,
    Partial,
    Annular,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipseEvent {
    /// Instant of greatest eclipse.
    pub time: TimePoint,
    pub body: EclipseBody,
    pub kind: EclipseKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// South to north.
    Ascending,
    /// North to south.
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEvent {
    pub time: TimePoint,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoonQuarter {
    New,
    FirstQuarter,
    Full,
    ThirdQuarter,
}

impl MoonQuarter {
    /// Sun-Moon ecliptic longitude difference at this quarter.
    pub fn phase_angle_deg(self) -> f64 {
        match self {
            Self::New => 0.0,
            Self::FirstQuarter => 90.0,
            Self::Full => 180.0,
            Self::ThirdQuarter => 270.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterEvent {
    pub time: TimePoint,
    pub quarter: MoonQuarter,
}

/// Morning or evening apparition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Morning,
    Evening,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElongationEvent {
    pub time: TimePoint,
    /// Angular distance from the Sun in degrees.
    pub elongation_deg: f64,
    pub visibility: Visibility,
}

/// Passage of an inner planet across the solar disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitEvent {
    pub start: TimePoint,
    pub peak: TimePoint,
    pub finish: TimePoint,
    /// Minimum planet-Sun centre separation in arcminutes.
    pub separation_arcmin: f64,
}

impl Timed for ApsisEvent {
    fn time(&self) -> TimePoint {
        self.time
    }
}

impl Timed for EclipseEvent {
    fn time(&self) -> TimePoint {
        self.time
    }
}

impl Timed for NodeEvent {
    fn time(&self) -> TimePoint {
        self.time
    }
}

impl Timed for QuarterEvent {
    fn time(&self) -> TimePoint {
        self.time
    }
}

impl Timed for ElongationEvent {
    fn time(&self) -> TimePoint {
        self.time
    }
}

impl Timed for TransitEvent {
    fn time(&self) -> TimePoint {
        self.peak
    }

    fn resume_after(&self) -> TimePoint {
        self.finish
    }
}

/// An event of any paginated category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecurringEvent {
    Apsis(ApsisEvent),
    Eclipse(EclipseEvent),
    Node(NodeEvent),
    Quarter(QuarterEvent),
    Elongation(ElongationEvent),
    Transit(TransitEvent),
}

impl RecurringEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Apsis(_) => EventCategory::Apsis,
            Self::Eclipse(_) => EventCategory::Eclipse,
            Self::Node(_) => EventCategory::Node,
            Self::Quarter(_) => EventCategory::Quarter,
            Self::Elongation(_) => EventCategory::Elongation,
            Self::Transit(_) => EventCategory::Transit,
        }
    }
}

impl Timed for RecurringEvent {
    fn time(&self) -> TimePoint {
        match self {
            Self::Apsis(e) => e.time(),
            Self::Eclipse(e) => e.time(),
            Self::Node(e) => e.time(),
            Self::Quarter(e) => e.time(),
            Self::Elongation(e) => e.time(),
            Self::Transit(e) => e.time(),
        }
    }

    fn resume_after(&self) -> TimePoint {
        match self {
            Self::Transit(e) => e.resume_after(),
            other => other.time(),
        }
    }
}

/// Cursor advance per category.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatorSettings {
    /// Advance used by categories without an override (days).
    pub advance_days: f64,
    pub overrides: HashMap<EventCategory, f64>,
}

impl PaginatorSettings {
    pub fn new(advance_days: f64) -> Self {
        Self {
            advance_days,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, category: EventCategory, advance_days: f64) -> Self {
        self.overrides.insert(category, advance_days);
        self
    }

    /// Advance applied after an event of `category`.
    pub fn advance_for(&self, category: EventCategory) -> f64 {
        self.overrides
            .get(&category)
            .copied()
            .unwrap_or(self.advance_days)
    }

    /// Validate the advance for one category.
    ///
    /// It must be positive, and shorter than the category's minimum event
    /// spacing or the cursor would jump over events.
    pub(crate) fn validate_for(&self, category: EventCategory) -> Result<(), &'static str> {
        let advance = self.advance_for(category);
        if !advance.is_finite() || advance <= 0.0 {
            return Err("advance_days must be positive");
        }
        if advance >= category.min_spacing_days() {
            return Err("advance_days must be shorter than the category's event spacing");
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        EventCategory::ALL
            .iter()
            .try_for_each(|&category| self.validate_for(category))
    }
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ADVANCE_DAYS)
    }
}
