//! Moonrise and moonset rows for a run of consecutive dates at one latitude.
//!
//! For `n` dates the row holds `2n` cells: the moonrises of each date, then the
//! moonsets of each date. The Moon's transit drifts about 50 minutes later every
//! day, so at high latitude it can rise (or set) twice on one date: the second event
//! goes into the `secondary` cells at the same index and the row is flagged as a
//! double-event row. Dates without a second event leave their secondary cell at
//! [`EventCell::NoEvent`].

use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    observer::{GeoLocation, Hemisphere},
    time::{CalendarDate, TimePrecision},
};

use super::{DayEvents, DaySearch, EventCell, EventFamily, EventKind, EventSearch, HorizonState};

/// Seek counters of the moon search, as reported in the run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoonSeekStats {
    /// Dates searched
    pub moon_days: u64,
    /// Dates with at least one rise or set
    pub moon_data_found: u64,
    /// Dates without crossing
    pub horizon_seeks: u64,
    /// Of those, dates classified from the carried state
    pub horizon_found: u64,
    /// Crossings whose search did not converge
    pub indeterminate: u64,
}

impl MoonSeekStats {
    pub fn record(&mut self, day: &DaySearch) {
        self.moon_days += 1;
        match &day.outcome {
            DayEvents::Events(events) => {
                if !events.is_empty() {
                    self.moon_data_found += 1;
                }
                self.indeterminate += events.iter().filter(|e| e.is_indeterminate()).count() as u64;
            }
            _ => {
                self.horizon_seeks += 1;
                if day.used_carry {
                    self.horizon_found += 1;
                }
            }
        }
    }

    pub fn merge(&mut self, other: &MoonSeekStats) {
        self.moon_days += other.moon_days;
        self.moon_data_found += other.moon_data_found;
        self.horizon_seeks += other.horizon_seeks;
        self.horizon_found += other.horizon_found;
        self.indeterminate += other.indeterminate;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoonRiseSetRow {
    pub first_date: CalendarDate,
    pub latitude: f64,
    pub hemisphere: Hemisphere,
    /// Rises of each date, then sets of each date
    pub primary: Vec<EventCell>,
    /// Second rise / second set of a date, same layout
    pub secondary: Vec<EventCell>,
    pub double_events: bool,
    /// Horizon state at the end of the last date
    pub carry: HorizonState,
}

impl MoonRiseSetRow {
    pub fn days(&self) -> usize {
        self.primary.len() / 2
    }
}

/// Per-date outcomes of a moonrise/moonset run, before layout.
pub fn moon_days(
    search: &EventSearch<'_>,
    first: CalendarDate,
    days: usize,
    observer: &GeoLocation,
    precision: TimePrecision,
    carry: HorizonState,
) -> Result<Vec<DaySearch>, AlmanacError> {
    let mut state = carry;
    (0..days as i64)
        .map(|i| {
            let day = search.search_day(
                Body::Moon,
                EventFamily::RiseSet,
                first.add_days(i),
                observer,
                precision,
                state,
            )?;
            state = day.end_state;
            Ok(day)
        })
        .collect()
}

/// Lay out per-date outcomes as a moonrise/moonset row.
pub fn layout_row(
    first: CalendarDate,
    latitude: f64,
    days: &[DaySearch],
    carry_in: HorizonState,
) -> MoonRiseSetRow {
    let n = days.len();
    let mut primary = vec![EventCell::NoEvent; 2 * n];
    let mut secondary = vec![EventCell::NoEvent; 2 * n];
    let mut double_events = false;

    for (i, day) in days.iter().enumerate() {
        for (offset, kind) in [(0, EventKind::Moonrise), (n, EventKind::Moonset)] {
            primary[offset + i] = day.outcome.cell(kind, 0);
            if day.outcome.of_kind(kind).len() > 1 {
                secondary[offset + i] = day.outcome.cell(kind, 1);
                double_events = true;
            }
        }
    }

    MoonRiseSetRow {
        first_date: first,
        latitude,
        hemisphere: Hemisphere::from_latitude(latitude),
        primary,
        secondary,
        double_events,
        carry: days.last().map(|d| d.end_state).unwrap_or(carry_in),
    }
}

/// Moonrise/moonset row for `days` dates from `first` at `latitude` (Greenwich meridian).
///
/// Arguments
/// -----------------
/// * `search`: the event search engine.
/// * `first`, `days`: the dates of the page (3 on nautical pages, 2 on event-time pages).
/// * `latitude`: latitude in degrees.
/// * `precision`: display unit.
/// * `carry`: horizon state at the end of the date before `first`.
///
/// Return
/// ----------
/// * The row (whose `carry` is the state to pass to the next page) and the per-date
///   searches, used for statistics.
pub fn moon_rise_set(
    search: &EventSearch<'_>,
    first: CalendarDate,
    days: usize,
    latitude: f64,
    precision: TimePrecision,
    carry: HorizonState,
) -> Result<(MoonRiseSetRow, Vec<DaySearch>), AlmanacError> {
    let observer = GeoLocation::on_greenwich(latitude)?;
    let per_day = moon_days(search, first, days, &observer, precision, carry)?;
    Ok((layout_row(first, latitude, &per_day, carry), per_day))
}
