//! Twilight row of the daily pages: six Sun events for one date and latitude.
//!
//! Column order: nautical dawn, civil dawn, sunrise, sunset, civil dusk, nautical dusk.
//! A column is [`EventCell::AlwaysAbove`] when the Sun never gets below that column's
//! threshold (white nights, midnight sun) and [`EventCell::AlwaysBelow`] when it never
//! gets above it (polar night).

use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    observer::{GeoLocation, Hemisphere},
    time::{CalendarDate, TimePrecision},
};

use super::{DayEvents, EventCell, EventFamily, EventKind, EventSearch, HorizonState};

/// Families searched for a twilight row, each giving a (dawn, dusk) pair of columns.
pub const TWILIGHT_FAMILIES: [(EventFamily, EventKind, EventKind); 3] = [
    (
        EventFamily::NauticalTwilight,
        EventKind::NauticalDawn,
        EventKind::NauticalDusk,
    ),
    (
        EventFamily::CivilTwilight,
        EventKind::CivilDawn,
        EventKind::CivilDusk,
    ),
    (EventFamily::RiseSet, EventKind::Sunrise, EventKind::Sunset),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilightRow {
    pub date: CalendarDate,
    pub latitude: f64,
    pub hemisphere: Hemisphere,
    /// nautical dawn, civil dawn, sunrise, sunset, civil dusk, nautical dusk
    pub cells: [EventCell; 6],
}

impl TwilightRow {
    /// The six cells as display strings.
    pub fn formatted(&self) -> [String; 6] {
        self.cells.map(|c| c.to_string())
    }
}

/// Compute the twilight row of `date` at `latitude` on the Greenwich meridian.
///
/// Arguments
/// -----------------
/// * `search`: the event search engine.
/// * `date`: civil date.
/// * `latitude`: latitude in degrees; its sign gives the hemisphere.
/// * `precision`: display unit.
///
/// Return
/// ----------
/// * The row, or the first ephemeris error.
pub fn twilight_row(
    search: &EventSearch<'_>,
    date: CalendarDate,
    latitude: f64,
    precision: TimePrecision,
) -> Result<TwilightRow, AlmanacError> {
    let observer = GeoLocation::on_greenwich(latitude)?;
    let mut outcomes = Vec::with_capacity(TWILIGHT_FAMILIES.len());
    for (family, _, _) in TWILIGHT_FAMILIES {
        let day = search.search_day(
            Body::Sun,
            family,
            date,
            &observer,
            precision,
            HorizonState::Unknown,
        )?;
        outcomes.push(day.outcome);
    }
    Ok(assemble_row(date, latitude, &outcomes))
}

/// Lay out the outcomes of the [`TWILIGHT_FAMILIES`] searches, in that order, as a row.
pub fn assemble_row(date: CalendarDate, latitude: f64, outcomes: &[DayEvents]) -> TwilightRow {
    let mut cells = [EventCell::NoEvent; 6];
    for (i, ((_, dawn, dusk), outcome)) in TWILIGHT_FAMILIES.iter().zip(outcomes).enumerate() {
        cells[i] = outcome.cell(*dawn, 0);
        cells[5 - i] = outcome.cell(*dusk, 0);
    }
    TwilightRow {
        date,
        latitude,
        hemisphere: Hemisphere::from_latitude(latitude),
        cells,
    }
}

#[cfg(test)]
mod twilight_test {
    use super::*;
    use crate::ephemeris::{
        low_precision::LowPrecisionEphemeris, EphemerisSpan, ModelEarthOrientation,
    };
    use std::sync::Arc;

    fn ephemeris() -> LowPrecisionEphemeris {
        LowPrecisionEphemeris::new(
            EphemerisSpan::De421,
            Arc::new(ModelEarthOrientation::default()),
        )
    }

    #[test]
    fn test_mid_latitude_row_is_ordered() {
        let eph = ephemeris();
        let search = EventSearch::new(&eph);
        let date = CalendarDate::new(2024, 10, 1).unwrap();
        let row = twilight_row(&search, date, 40.0, TimePrecision::Minute).unwrap();
        let secs: Vec<i64> = row
            .cells
            .iter()
            .map(|c| match c {
                EventCell::Time(t) => t.seconds_of_day(),
                other => panic!("unexpected cell {other:?}"),
            })
            .collect();
        assert!(secs.windows(2).all(|w| w[0] < w[1]), "{secs:?}");
        assert_eq!(row.hemisphere, Hemisphere::North);
    }

    #[test]
    fn test_white_nights_at_60n() {
        let eph = ephemeris();
        let search = EventSearch::new(&eph);
        let date = CalendarDate::new(2024, 6, 21).unwrap();
        let row = twilight_row(&search, date, 60.0, TimePrecision::Minute).unwrap();
        // Sun stays above −12° all night, but rises and sets
        assert_eq!(row.cells[0], EventCell::AlwaysAbove);
        assert_eq!(row.cells[5], EventCell::AlwaysAbove);
        assert!(row.cells[2].is_time() && row.cells[3].is_time());
        assert_eq!(row.formatted()[0], "^^:^^");
    }
}
