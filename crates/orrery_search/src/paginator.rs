//! "Next event at or after the cursor" pagination over recurring phenomena.
//!
//! One paginator wraps one oracle. Every call asks the oracle for the first
//! event at or after the cursor, then moves the cursor past that event by a
//! fixed advance. Because the cursor always ends up strictly after the
//! returned instant, and events before the cursor are rejected, returned
//! times strictly increase whatever the oracle does.
//!
//! The advance must be shorter than the oracle's real event spacing. An
//! advance that is too short for an oracle with sub-daily cadence can make
//! the same physical event come back twice; that is a caller contract
//! violation and is not detected here.

use std::fmt::{Debug, Formatter};

use orrery_time::TimePoint;
use tracing::debug;

use crate::error::{OracleResult, SearchError};
use crate::paginator_types::{
    ApsisEvent, EclipseEvent, ElongationEvent, EventCategory, EventCursor, NodeEvent,
    PaginatorSettings, QuarterEvent, RecurringEvent, Timed, TransitEvent,
};

/// Finds the first event at or after a cursor.
pub trait EventOracle {
    type Event: Timed;

    /// `Ok(None)` when no further event exists within the oracle's horizon.
    fn find_next(&mut self, cursor: TimePoint) -> OracleResult<Option<Self::Event>>;
}

impl<E, F> EventOracle for F
where
    E: Timed,
    F: FnMut(TimePoint) -> OracleResult<Option<E>>,
{
    type Event = E;

    fn find_next(&mut self, cursor: TimePoint) -> OracleResult<Option<E>> {
        self(cursor)
    }
}

/// Stateful pagination over one oracle.
#[derive(Debug)]
pub struct EventPaginator<O> {
    oracle: O,
    cursor: EventCursor,
    advance_days: f64,
}

const ADVANCE_TOO_SMALL: &str = "advance_days is below the time resolution at the cursor";

fn validate_advance(advance_days: f64) -> Result<(), SearchError> {
    if !advance_days.is_finite() || advance_days <= 0.0 {
        return Err(SearchError::InvalidConfig("advance_days must be positive"));
    }
    Ok(())
}

impl<O: EventOracle> EventPaginator<O> {
    /// Start paginating at `start` (commonly "now").
    pub fn new(oracle: O, start: TimePoint, advance_days: f64) -> Result<Self, SearchError> {
        Self::resume(oracle, EventCursor { last_time: start }, advance_days)
    }

    /// Continue from a previously saved cursor.
    pub fn resume(oracle: O, cursor: EventCursor, advance_days: f64) -> Result<Self, SearchError> {
        if !cursor.last_time.is_finite() {
            return Err(SearchError::InvalidConfig("cursor must be finite"));
        }
        validate_advance(advance_days)?;
        if cursor.last_time + advance_days <= cursor.last_time {
            return Err(SearchError::InvalidConfig(ADVANCE_TOO_SMALL));
        }
        Ok(Self {
            oracle,
            cursor,
            advance_days,
        })
    }

    pub fn cursor(&self) -> EventCursor {
        self.cursor
    }

    pub fn advance_days(&self) -> f64 {
        self.advance_days
    }

    /// Return the next event and move the cursor past it.
    ///
    /// `Ok(None)` and errors leave the cursor untouched. An advance that
    /// rounds away at the event's Julian Date is an `InvalidConfig` error,
    /// since the cursor could not move past the event.
    pub fn next_event(&mut self) -> Result<Option<O::Event>, SearchError> {
        let cursor = self.cursor.last_time;
        let Some(event) = self.oracle.find_next(cursor)? else {
            debug!(%cursor, "oracle reported no further event");
            return Ok(None);
        };

        let time = event.time();
        if time < cursor {
            return Err(SearchError::OracleRegressed {
                cursor,
                event: time,
            });
        }

        let resume = event.resume_after().max(time);
        let next = resume + self.advance_days;
        if next <= resume {
            return Err(SearchError::InvalidConfig(ADVANCE_TOO_SMALL));
        }
        self.cursor.last_time = next;
        debug!(%time, next_cursor = %self.cursor.last_time, "event returned");
        Ok(Some(event))
    }

    /// Collect events strictly before `end`, at most `limit` of them.
    ///
    /// An event found at or after `end` is not consumed: the cursor stays
    /// where it was before that lookup.
    pub fn collect_until(
        &mut self,
        end: TimePoint,
        limit: usize,
    ) -> Result<Vec<O::Event>, SearchError> {
        let mut events = Vec::new();
        while events.len() < limit {
            let saved = self.cursor;
            match self.next_event()? {
                Some(event) if event.time() < end => events.push(event),
                Some(_) => {
                    self.cursor = saved;
                    break;
                }
                None => break,
            }
        }
        Ok(events)
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }
}

impl<O: EventOracle> Iterator for EventPaginator<O> {
    type Item = Result<O::Event, SearchError>;

    /// Ends when the oracle reports no further event.
    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

type BoxedOracle<'a, E> = Box<dyn FnMut(TimePoint) -> OracleResult<Option<E>> + 'a>;

/// One oracle per event category, dispatched through a single paginator.
pub enum CategoryOracle<'a> {
    Apsis(BoxedOracle<'a, ApsisEvent>),
    Eclipse(BoxedOracle<'a, EclipseEvent>),
    Node(BoxedOracle<'a, NodeEvent>),
    Quarter(BoxedOracle<'a, QuarterEvent>),
    Elongation(BoxedOracle<'a, ElongationEvent>),
    Transit(BoxedOracle<'a, TransitEvent>),
}

impl<'a> CategoryOracle<'a> {
    pub fn apsis(f: impl FnMut(TimePoint) -> OracleResult<Option<ApsisEvent>> + 'a) -> Self {
        Self::Apsis(Box::new(f))
    }

    pub fn eclipse(f: impl FnMut(TimePoint) -> OracleResult<Option<EclipseEvent>> + 'a) -> Self {
        Self::Eclipse(Box::new(f))
    }

    pub fn node(f: impl FnMut(TimePoint) -> OracleResult<Option<NodeEvent>> + 'a) -> Self {
        Self::Node(Box::new(f))
    }

    pub fn quarter(f: impl FnMut(TimePoint) -> OracleResult<Option<QuarterEvent>> + 'a) -> Self {
        Self::Quarter(Box::new(f))
    }

    pub fn elongation(
        f: impl FnMut(TimePoint) -> OracleResult<Option<ElongationEvent>> + 'a,
    ) -> Self {
        Self::Elongation(Box::new(f))
    }

    pub fn transit(f: impl FnMut(TimePoint) -> OracleResult<Option<TransitEvent>> + 'a) -> Self {
        Self::Transit(Box::new(f))
    }

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

impl Debug for CategoryOracle<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CategoryOracle")
            .field(&self.category())
            .finish()
    }
}

impl EventOracle for CategoryOracle<'_> {
    type Event = RecurringEvent;

    fn find_next(&mut self, cursor: TimePoint) -> OracleResult<Option<RecurringEvent>> {
        Ok(match self {
            Self::Apsis(f) => f(cursor)?.map(RecurringEvent::Apsis),
            Self::Eclipse(f) => f(cursor)?.map(RecurringEvent::Eclipse),
            Self::Node(f) => f(cursor)?.map(RecurringEvent::Node),
            Self::Quarter(f) => f(cursor)?.map(RecurringEvent::Quarter),
            Self::Elongation(f) => f(cursor)?.map(RecurringEvent::Elongation),
            Self::Transit(f) => f(cursor)?.map(RecurringEvent::Transit),
        })
    }
}

/// Build a paginator for a category oracle, using that category's advance.
pub fn make_paginator<'a>(
    oracle: CategoryOracle<'a>,
    start: TimePoint,
    settings: &PaginatorSettings,
) -> Result<EventPaginator<CategoryOracle<'a>>, SearchError> {
    let category = oracle.category();
    settings
        .validate_for(category)
        .map_err(SearchError::InvalidConfig)?;
    EventPaginator::new(oracle, start, settings.advance_for(category))
}
