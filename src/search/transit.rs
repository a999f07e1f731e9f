//! Meridian passages and the equation-of-time section of the daily pages.
//!
//! Two ways of finding a Greenwich passage coexist:
//!
//! * [`meridian_transit`] root-finds the hour angle with the event search engine
//!   (used for the planet meridian-passage table),
//! * [`passage_from_hourly_gha`] interpolates the boundary-adjusted 25-point GHA list
//!   of a sample set, which is how the Sun and Moon passages of the equation-of-time
//!   section are obtained without extra ephemeris evaluations.

use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    constants::{Degree, SECONDS_PER_DAY, SECONDS_PER_HOUR},
    ephemeris::wrap180,
    observer::GeoLocation,
    sampler::ObservableSampler,
    time::{CalendarDate, DisplayTime, TimePrecision},
};

use super::{
    lunation::{moon_phase, MoonPhase},
    EventCell, EventFamily, EventKind, EventSearch, HorizonState,
};

/// Greenwich meridian passage of a body on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeridianPassage {
    pub body: Body,
    /// Sidereal hour angle at 00h, absent for Aries
    pub sha: Option<Degree>,
    pub cell: EventCell,
}

/// Upper meridian passage of `body` at Greenwich on `date` with its SHA at 00h.
///
/// Arguments
/// -----------------
/// * `search`: the event search engine.
/// * `body`: any body.
/// * `date`: civil date.
/// * `precision`: display unit of the passage time.
///
/// Return
/// ----------
/// * The passage; its cell is [`EventCell::NoEvent`] on the rare date the body does
///   not transit (transit drifting across midnight).
pub fn meridian_transit(
    search: &EventSearch<'_>,
    body: Body,
    date: CalendarDate,
    precision: TimePrecision,
) -> Result<MeridianPassage, AlmanacError> {
    let greenwich = GeoLocation::on_greenwich(0.0)?;
    let day = search.search_day(
        body,
        EventFamily::Transit,
        date,
        &greenwich,
        precision,
        HorizonState::Unknown,
    )?;

    let sha = if body == Body::Aries {
        None
    } else {
        let midnight = date.midnight();
        let aries = search.ephemeris().apparent_place(Body::Aries, midnight)?.gha;
        Some(search.ephemeris().apparent_place(body, midnight)?.sha(aries))
    };

    Ok(MeridianPassage {
        body,
        sha,
        cell: day.outcome.cell(EventKind::UpperTransit, 0),
    })
}

/// Instants, in seconds from `date` 00:00, of the 25 entries of a passage list.
fn passage_list_seconds(precision: TimePrecision) -> [f64; 25] {
    let (sod, eod) = precision.day_window();
    std::array::from_fn(|i| match i {
        0 => sod,
        24 => eod,
        h => h as f64 * SECONDS_PER_HOUR,
    })
}

/// Passage time from a boundary-adjusted GHA list `[start of day, 01h … 23h, end of day]`.
///
/// The passage is where the list wraps from 360° back to 0°; the instant is linearly
/// interpolated in the interval that wraps.
///
/// Return
/// ----------
/// * The rounded time, or [`EventCell::NoEvent`] when the list does not wrap or the
///   passage rounds onto another date.
pub fn passage_from_hourly_gha(
    list: &[Degree; 25],
    date: CalendarDate,
    precision: TimePrecision,
) -> EventCell {
    let times = passage_list_seconds(precision);
    let Some(i) = (0..24).find(|&i| list[i] > list[i + 1]) else {
        return EventCell::NoEvent;
    };
    let (a, b) = (list[i], list[i + 1]);
    let frac = (360.0 - a) / (b + 360.0 - a);
    let t = times[i] + frac * (times[i + 1] - times[i]);
    let display = DisplayTime::round(date, t, precision);
    if display.date == date {
        EventCell::Time(display)
    } else {
        EventCell::NoEvent
    }
}

/// Equation of time in seconds from the Sun's GHA at `hour` (positive when the
/// apparent Sun is ahead of the mean Sun).
pub fn equation_of_time(sun_gha: Degree, hour: usize) -> f64 {
    wrap180(sun_gha - (180.0 + 15.0 * hour as f64)) * SECONDS_PER_DAY / 360.0
}

/// Equation-of-time section of a daily page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquationOfTimeRow {
    pub date: CalendarDate,
    /// Seconds at 00h
    pub eot_00: f64,
    /// Seconds at 12h
    pub eot_12: f64,
    pub sun_mer_pass: EventCell,
    pub moon_upper: EventCell,
    pub moon_lower: EventCell,
    /// Days since the last new moon, at 12h
    pub moon_age_days: f64,
    /// Illuminated fraction of the disk at 12h, percent
    pub moon_illuminated_pct: f64,
}

/// Build the equation-of-time section for `date`.
///
/// Sun and Moon passages are rounded to the minute, as printed.
///
/// See also
/// ------------
/// * [`passage_from_hourly_gha`] – passage interpolation.
/// * [`moon_phase`] – age and illuminated fraction.
pub fn equation_of_time_row(
    sampler: &mut ObservableSampler,
    date: CalendarDate,
) -> Result<EquationOfTimeRow, AlmanacError> {
    let sun = sampler.sun_observables(date)?;
    let moon = sampler.moon_observables(date)?;
    let precision = sun.boundary_precision;
    let MoonPhase {
        age_days,
        illuminated_pct,
    } = moon_phase(sampler.ephemeris().as_ref(), date)?;

    Ok(EquationOfTimeRow {
        date,
        eot_00: equation_of_time(sun.gha[0], 0),
        eot_12: equation_of_time(sun.gha[12], 12),
        sun_mer_pass: passage_from_hourly_gha(&sun.passage_list(), date, precision),
        moon_upper: passage_from_hourly_gha(&moon.upper_gha, date, precision),
        moon_lower: passage_from_hourly_gha(&moon.lower_gha, date, precision),
        moon_age_days: age_days,
        moon_illuminated_pct: illuminated_pct,
    })
}
