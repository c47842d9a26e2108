//! Event-search engine over continuous time.
//!
//! This crate provides:
//! - Threshold interval scanning (occultation-style "inside the threshold" windows)
//! - Zero-crossing search with bracket refinement (aspects, phases, nodes)
//! - Cursor-based pagination over "next event after T" oracles
//! - Duplicate suppression, cooperative cancellation and a scoped worker pool
//! - An aspect calendar driver and TOML settings
//!
//! Physical quantities come from caller-supplied oracles; the engine only
//! samples them.

pub mod aspect;
pub mod aspect_calendar;
pub mod cancel;
pub mod crossing;
pub mod crossing_types;
pub mod dedup;
pub mod error;
pub mod paginator;
pub mod paginator_types;
pub mod parallel;
pub(crate) mod search_util;
pub mod settings;
pub mod threshold;
pub mod threshold_types;

pub use aspect::{
    Aspect, AspectHit, MAJOR_ASPECTS, angle_diff, angular_separation_deg, aspect_offset,
    find_aspects, longitude_offset,
};
pub use aspect_calendar::{AspectCalendar, AspectUnit, CalendarEntry};
pub use cancel::CancelFlag;
pub use crossing::{find_zero_crossings, find_zero_crossings_cancellable};
pub use crossing_types::{
    CrossingConfig, CrossingEvent, RefineMethod, StepSizer, synodic_period_days,
};
pub use dedup::{DedupKey, DedupLedger};
pub use error::{OracleError, OracleResult, SearchError};
pub use orrery_time::TimePoint;
pub use paginator::{CategoryOracle, EventOracle, EventPaginator, make_paginator};
pub use paginator_types::{
    ApsisEvent, ApsisKind, EclipseBody, EclipseEvent, EclipseKind, ElongationEvent, EventCategory,
    EventCursor, MoonQuarter, NodeEvent, NodeKind, PaginatorSettings, QuarterEvent,
    RecurringEvent, Timed, TransitEvent, Visibility,
};
pub use parallel::run_units;
pub use settings::{BodySpec, Catalog, SearchSettings, SettingsError, StarSpec};
pub use threshold::{
    scan_targets, scan_threshold_intervals, scan_threshold_intervals_cancellable,
    scan_threshold_intervals_report,
};
pub use threshold_types::{IntervalEvent, ScanConfig, ScanReport, TargetInterval};
