//! # Event search engine
//!
//! Finds the discrete daily events of a body for an observer by root-finding its
//! altitude against a threshold:
//!
//! | Family | Body | Threshold on the centre's altitude |
//! |---|---|---|
//! | [`EventFamily::RiseSet`] | Sun, Moon | −(34′ + semidiameter at 12h) |
//! | [`EventFamily::RiseSet`] | planets, stars | −34′ |
//! | [`EventFamily::CivilTwilight`] | Sun | −6° |
//! | [`EventFamily::NauticalTwilight`] | Sun | −12° |
//! | [`EventFamily::Transit`] | any | local hour angle crossing 0° / 180° |
//!
//! ## Day attribution
//! -----------------
//! A date `D` is searched over `[D − unit/2, D+1 − unit/2)`, the exact set of instants
//! that round onto `D` at the display unit (see [`TimePrecision::day_window`]). Each
//! event found is rounded half-up and kept only if it is attributed to `D`, so an event
//! at 23:59:59.6 is reported on the following date.
//!
//! ## Outcomes
//! -----------------
//! A day is either a list of events (any number, the Moon may rise or set twice) or one
//! of the terminal states [`DayEvents::ContinuouslyAbove`] /
//! [`DayEvents::ContinuouslyBelow`]. A crossing whose bisection does not converge is
//! kept in the list as [`EventTime::Indeterminate`].
//!
//! ## Carry state
//! -----------------
//! [`HorizonState`] is the above/below state at the end of the previous day. It is
//! threaded through consecutive days by [`EventSearch::find_events`] and by the
//! per-latitude workers; when no crossing is found it classifies the day without an
//! extra altitude evaluation.

pub mod lunation;
pub mod moonrise;
pub mod root_finding;
pub mod transit;
pub mod twilight;

use std::fmt;

use hifitime::Epoch;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    constants::{
        Degree, CIVIL_TWILIGHT_DEPRESSION, NAUTICAL_TWILIGHT_DEPRESSION, REFRACTION_HORIZON,
        SECONDS_PER_DAY, SUN_SEMIDIAMETER_DEFAULT,
    },
    ephemeris::{wrap180, EphemerisProvider},
    observer::GeoLocation,
    time::{CalendarDate, DisplayTime, TimePrecision},
};

use self::root_finding::{bisect, grid, is_up, scan, Refinement, SearchParams};

/// Family of events searched together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFamily {
    RiseSet,
    CivilTwilight,
    NauticalTwilight,
    Transit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Sunrise,
    Sunset,
    CivilDawn,
    CivilDusk,
    NauticalDawn,
    NauticalDusk,
    Moonrise,
    Moonset,
    /// Rising of a planet or star
    Rise,
    /// Setting of a planet or star
    Set,
    UpperTransit,
    LowerTransit,
}

impl EventKind {
    /// Kind of an upward (`rising = true`) or downward threshold crossing.
    fn crossing(body: Body, family: EventFamily, rising: bool) -> Self {
        use EventKind::*;
        match (family, body, rising) {
            (EventFamily::RiseSet, Body::Sun, true) => Sunrise,
            (EventFamily::RiseSet, Body::Sun, false) => Sunset,
            (EventFamily::RiseSet, Body::Moon, true) => Moonrise,
            (EventFamily::RiseSet, Body::Moon, false) => Moonset,
            (EventFamily::RiseSet, _, true) => Rise,
            (EventFamily::RiseSet, _, false) => Set,
            (EventFamily::CivilTwilight, _, true) => CivilDawn,
            (EventFamily::CivilTwilight, _, false) => CivilDusk,
            (EventFamily::NauticalTwilight, _, true) => NauticalDawn,
            (EventFamily::NauticalTwilight, _, false) => NauticalDusk,
            (EventFamily::Transit, _, true) => UpperTransit,
            (EventFamily::Transit, _, false) => LowerTransit,
        }
    }

    /// Whether the kind marks the body going up (rise, dawn).
    pub fn is_rising(&self) -> bool {
        use EventKind::*;
        matches!(self, Sunrise | CivilDawn | NauticalDawn | Moonrise | Rise)
    }
}

/// Instant of an event, or the bracket a non-converged search ended with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventTime {
    At(Epoch),
    Indeterminate {
        bracket_start: Epoch,
        bracket_end: Epoch,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub time: EventTime,
    /// Rounded display time, absent when indeterminate
    pub display: Option<DisplayTime>,
}

impl Event {
    pub fn is_indeterminate(&self) -> bool {
        matches!(self.time, EventTime::Indeterminate { .. })
    }

    pub fn cell(&self) -> EventCell {
        match self.display {
            Some(t) => EventCell::Time(t),
            None => EventCell::Indeterminate,
        }
    }
}

/// Outcome of one day's search.
#[derive(Debug, Clone, PartialEq)]
pub enum DayEvents {
    /// Events in time order (possibly empty when a crossing is attributed to a neighbour day)
    Events(Vec<Event>),
    /// No crossing, body at or above the threshold all day
    ContinuouslyAbove,
    /// No crossing, body below the threshold all day
    ContinuouslyBelow,
}

impl DayEvents {
    /// Events of `kind`, in time order.
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        match self {
            DayEvents::Events(events) => events.iter().filter(|e| e.kind == kind).copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        match self {
            DayEvents::Events(events) => events,
            _ => &[],
        }
    }

    /// Table cell for the `n`-th (0-based) event of `kind` on the day.
    pub fn cell(&self, kind: EventKind, n: usize) -> EventCell {
        match self {
            DayEvents::ContinuouslyAbove => EventCell::AlwaysAbove,
            DayEvents::ContinuouslyBelow => EventCell::AlwaysBelow,
            DayEvents::Events(_) => self
                .of_kind(kind)
                .get(n)
                .map(Event::cell)
                .unwrap_or(EventCell::NoEvent),
        }
    }
}

/// What a table prints for one event slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCell {
    Time(DisplayTime),
    /// The event does not occur on that date
    NoEvent,
    /// Body above the threshold all day
    AlwaysAbove,
    /// Body below the threshold all day
    AlwaysBelow,
    /// Search did not converge
    Indeterminate,
}

impl EventCell {
    pub fn is_time(&self) -> bool {
        matches!(self, EventCell::Time(_))
    }
}

impl fmt::Display for EventCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCell::Time(t) => write!(f, "{t}"),
            EventCell::NoEvent => f.write_str("--:--"),
            EventCell::AlwaysAbove => f.write_str("^^:^^"),
            EventCell::AlwaysBelow => f.write_str("vv:vv"),
            EventCell::Indeterminate => f.write_str("??:??"),
        }
    }
}

/// Above/below state of a body relative to a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HorizonState {
    #[default]
    Unknown,
    Above,
    Below,
}

impl HorizonState {
    fn from_value(value: f64) -> Self {
        if is_up(value) {
            HorizonState::Above
        } else {
            HorizonState::Below
        }
    }
}

/// Full result of a single-day search.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySearch {
    pub date: CalendarDate,
    pub outcome: DayEvents,
    /// State at the end of the search window, to carry into the next date
    pub end_state: HorizonState,
    /// Whether a no-crossing day was classified from the carried state
    pub used_carry: bool,
}

/// Root-finding front-end over an [`EphemerisProvider`].
#[derive(Debug, Clone, Copy)]
pub struct EventSearch<'a> {
    ephemeris: &'a dyn EphemerisProvider,
    params: SearchParams,
}

impl<'a> EventSearch<'a> {
    pub fn new(ephemeris: &'a dyn EphemerisProvider) -> Self {
        Self::with_params(ephemeris, SearchParams::default())
    }

    pub fn with_params(ephemeris: &'a dyn EphemerisProvider, params: SearchParams) -> Self {
        EventSearch { ephemeris, params }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn ephemeris(&self) -> &'a dyn EphemerisProvider {
        self.ephemeris
    }

    /// Reject body/family combinations that have no meaning.
    pub fn validate(body: Body, family: EventFamily) -> Result<(), AlmanacError> {
        match (family, body) {
            (EventFamily::CivilTwilight | EventFamily::NauticalTwilight, Body::Sun) => Ok(()),
            (EventFamily::CivilTwilight | EventFamily::NauticalTwilight, other) => Err(
                AlmanacError::UnsupportedBody(format!("twilight is defined for the Sun, not {other}")),
            ),
            (EventFamily::RiseSet, Body::Aries) => Err(AlmanacError::UnsupportedBody(
                "Aries has no rising or setting".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Altitude threshold of `family` for `body` on `date`, degrees.
    pub fn threshold(
        &self,
        body: Body,
        family: EventFamily,
        date: CalendarDate,
    ) -> Result<Degree, AlmanacError> {
        Self::validate(body, family)?;
        Ok(match family {
            EventFamily::CivilTwilight => -CIVIL_TWILIGHT_DEPRESSION,
            EventFamily::NauticalTwilight => -NAUTICAL_TWILIGHT_DEPRESSION,
            EventFamily::RiseSet if body.has_disk() => {
                let noon = date.at_seconds(SECONDS_PER_DAY / 2.0);
                let sd = self.ephemeris.apparent_place(body, noon)?.semidiameter;
                let sd = if sd > 0.0 || body == Body::Moon {
                    sd
                } else {
                    SUN_SEMIDIAMETER_DEFAULT
                };
                -(REFRACTION_HORIZON + sd)
            }
            EventFamily::RiseSet => -REFRACTION_HORIZON,
            EventFamily::Transit => 0.0,
        })
    }

    /// Search one date.
    ///
    /// Arguments
    /// -----------------
    /// * `body`, `family`: what to search.
    /// * `date`: the civil date the events are attributed to.
    /// * `observer`: observer location.
    /// * `precision`: display unit used for rounding and day attribution.
    /// * `carry`: state at the end of the previous date, [`HorizonState::Unknown`] if none.
    ///
    /// Return
    /// ----------
    /// * The day's outcome and the state to carry into the next date.
    ///
    /// See also
    /// ------------
    /// * [`EventSearch::find_events`] – consecutive dates with the carry threaded through.
    pub fn search_day(
        &self,
        body: Body,
        family: EventFamily,
        date: CalendarDate,
        observer: &GeoLocation,
        precision: TimePrecision,
        carry: HorizonState,
    ) -> Result<DaySearch, AlmanacError> {
        if family == EventFamily::Transit {
            return self.search_transits(body, date, observer, precision);
        }
        self.ephemeris.check_year(date.year)?;
        let threshold = self.threshold(body, family, date)?;
        let f = |t: f64| -> Result<f64, AlmanacError> {
            Ok(self.ephemeris.altitude(body, date.at_seconds(t), observer)? - threshold)
        };
        self.search_window(date, precision, carry, f, |rising| {
            EventKind::crossing(body, family, rising)
        })
    }

    /// Upper and lower meridian transits on `date` at the observer's meridian.
    fn search_transits(
        &self,
        body: Body,
        date: CalendarDate,
        observer: &GeoLocation,
        precision: TimePrecision,
    ) -> Result<DaySearch, AlmanacError> {
        self.ephemeris.check_year(date.year)?;
        let mut events = Vec::new();
        for (target, kind) in [(0.0, EventKind::UpperTransit), (180.0, EventKind::LowerTransit)] {
            let h = |t: f64| -> Result<f64, AlmanacError> {
                let place = self.ephemeris.apparent_place(body, date.at_seconds(t))?;
                Ok(wrap180(place.gha + observer.longitude - target))
            };
            let (w0, w1) = precision.day_window();
            let instants = grid(w0, w1, self.params.coarse_step_s);
            let (_, brackets) = scan(&instants, h)?;
            for bracket in brackets
                .iter()
                .filter(|b| b.is_rising() && b.f_lo.abs() < 90.0 && b.f_hi.abs() < 90.0)
            {
                if let Some(event) = self.refine(date, precision, w1, h, bracket, kind)? {
                    events.push(event);
                }
            }
        }
        events.sort_by(|a, b| event_order(a).total_cmp(&event_order(b)));
        Ok(DaySearch {
            date,
            outcome: DayEvents::Events(events),
            end_state: HorizonState::Unknown,
            used_carry: false,
        })
    }

    fn search_window<F, K>(
        &self,
        date: CalendarDate,
        precision: TimePrecision,
        carry: HorizonState,
        f: F,
        kind_of: K,
    ) -> Result<DaySearch, AlmanacError>
    where
        F: Fn(f64) -> Result<f64, AlmanacError>,
        K: Fn(bool) -> EventKind,
    {
        let (w0, w1) = precision.day_window();
        let instants = grid(w0, w1, self.params.coarse_step_s);
        let (values, brackets) = scan(&instants, &f)?;

        let first_state = HorizonState::from_value(values[0]);
        let end_state = HorizonState::from_value(values[values.len() - 1]);

        if brackets.is_empty() {
            let (state, used_carry) = if carry == first_state {
                (carry, true)
            } else {
                let mid = f(0.5 * (w0 + w1))?;
                (HorizonState::from_value(mid), false)
            };
            let outcome = match state {
                HorizonState::Below => DayEvents::ContinuouslyBelow,
                _ => DayEvents::ContinuouslyAbove,
            };
            return Ok(DaySearch {
                date,
                outcome,
                end_state,
                used_carry,
            });
        }

        let mut events = Vec::with_capacity(brackets.len());
        for bracket in &brackets {
            let kind = kind_of(bracket.is_rising());
            if let Some(event) = self.refine(date, precision, w1, &f, bracket, kind)? {
                events.push(event);
            }
        }
        Ok(DaySearch {
            date,
            outcome: DayEvents::Events(events),
            end_state,
            used_carry: false,
        })
    }

    /// Bisect one bracket and turn it into an event attributed to `date`, if it belongs there.
    fn refine<F>(
        &self,
        date: CalendarDate,
        precision: TimePrecision,
        window_end: f64,
        f: F,
        bracket: &root_finding::Bracket,
        kind: EventKind,
    ) -> Result<Option<Event>, AlmanacError>
    where
        F: Fn(f64) -> Result<f64, AlmanacError>,
    {
        match bisect(&f, bracket, &self.params)? {
            Refinement::Converged(t) => {
                if t >= window_end {
                    return Ok(None);
                }
                let display = DisplayTime::round(date, t, precision);
                if display.date != date {
                    return Ok(None);
                }
                Ok(Some(Event {
                    kind,
                    time: EventTime::At(date.at_seconds(t)),
                    display: Some(display),
                }))
            }
            Refinement::NotConverged { lo, hi } => {
                warn!("{kind:?} on {date}: bisection did not converge in [{lo:.1} s, {hi:.1} s]");
                Ok(Some(Event {
                    kind,
                    time: EventTime::Indeterminate {
                        bracket_start: date.at_seconds(lo),
                        bracket_end: date.at_seconds(hi),
                    },
                    display: None,
                }))
            }
        }
    }

    /// Search `days` consecutive dates starting at `first`, carrying the horizon state.
    ///
    /// Return
    /// ----------
    /// * One [`DaySearch`] per date, in date order.
    pub fn find_events(
        &self,
        body: Body,
        family: EventFamily,
        first: CalendarDate,
        days: usize,
        observer: &GeoLocation,
        precision: TimePrecision,
    ) -> Result<Vec<DaySearch>, AlmanacError> {
        Self::validate(body, family)?;
        let mut carry = HorizonState::Unknown;
        (0..days as i64)
            .map(|i| {
                let day = self.search_day(
                    body,
                    family,
                    first.add_days(i),
                    observer,
                    precision,
                    carry,
                )?;
                carry = day.end_state;
                Ok(day)
            })
            .collect()
    }

    /// All events of [`find_events`](EventSearch::find_events) flattened in time order.
    pub fn ordered_events(
        &self,
        body: Body,
        family: EventFamily,
        first: CalendarDate,
        days: usize,
        observer: &GeoLocation,
        precision: TimePrecision,
    ) -> Result<Vec<Event>, AlmanacError> {
        Ok(self
            .find_events(body, family, first, days, observer, precision)?
            .into_iter()
            .flat_map(|d| d.outcome.events().to_vec())
            .collect())
    }
}

/// Sort key of an event: its instant, or the start of its bracket.
fn event_order(e: &Event) -> f64 {
    match e.time {
        EventTime::At(t) => t.to_mjd_utc_days(),
        EventTime::Indeterminate { bracket_start, .. } => bracket_start.to_mjd_utc_days(),
    }
}

#[cfg(test)]
mod search_test {
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
    fn test_greenwich_sunrise_equinox() {
        let eph = ephemeris();
        let search = EventSearch::new(&eph);
        let date = CalendarDate::new(2024, 3, 20).unwrap();
        let obs = GeoLocation::new(51.5, 0.0).unwrap();
        let day = search
            .search_day(
                Body::Sun,
                EventFamily::RiseSet,
                date,
                &obs,
                TimePrecision::Minute,
                HorizonState::Unknown,
            )
            .unwrap();
        let rises = day.outcome.of_kind(EventKind::Sunrise);
        let sets = day.outcome.of_kind(EventKind::Sunset);
        assert_eq!((rises.len(), sets.len()), (1, 1));
        // London 2024-03-20: sunrise 06:02, sunset 18:14 UTC (±2 min at 0° longitude)
        let rise = rises[0].display.unwrap().seconds_of_day();
        let set = sets[0].display.unwrap().seconds_of_day();
        assert!((rise - (6 * 3600 + 2 * 60)).abs() <= 240, "rise {rise}");
        assert!((set - (18 * 3600 + 14 * 60)).abs() <= 240, "set {set}");
        assert_eq!(day.end_state, HorizonState::Below);
    }

    #[test]
    fn test_twilight_rejects_moon() {
        assert!(matches!(
            EventSearch::validate(Body::Moon, EventFamily::CivilTwilight),
            Err(AlmanacError::UnsupportedBody(_))
        ));
        assert!(EventSearch::validate(Body::Moon, EventFamily::RiseSet).is_ok());
    }

    #[test]
    fn test_sun_transit_near_noon() {
        let eph = ephemeris();
        let search = EventSearch::new(&eph);
        let date = CalendarDate::new(2024, 11, 3).unwrap();
        let obs = GeoLocation::new(0.0, 0.0).unwrap();
        let day = search
            .search_day(
                Body::Sun,
                EventFamily::Transit,
                date,
                &obs,
                TimePrecision::Second,
                HorizonState::Unknown,
            )
            .unwrap();
        let upper = day.outcome.of_kind(EventKind::UpperTransit);
        assert_eq!(upper.len(), 1);
        // equation of time ≈ +16.4 min: transit ≈ 11:43:36
        let t = upper[0].display.unwrap().seconds_of_day();
        assert!((t - (11 * 3600 + 43 * 60 + 36)).abs() < 30, "transit {t}");
        assert_eq!(day.outcome.of_kind(EventKind::LowerTransit).len(), 1);
    }

    #[test]
    fn test_cell_markers() {
        assert_eq!(EventCell::NoEvent.to_string(), "--:--");
        assert_eq!(
            DayEvents::ContinuouslyAbove.cell(EventKind::Sunrise, 0),
            EventCell::AlwaysAbove
        );
        assert_eq!(
            DayEvents::Events(vec![]).cell(EventKind::Moonrise, 1),
            EventCell::NoEvent
        );
    }
}
