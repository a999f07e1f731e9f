mod common;

use common::{
    cell_seconds, date, ConstantAltitude, NanAltitude, RampAltitude, SineAltitude, MOON_THRESHOLD,
};
use navalmanac::{
    constants::STANDARD_LATITUDES,
    search::{
        moonrise::moon_rise_set, root_finding::SearchParams, twilight::twilight_row, EventTime,
    },
    AlmanacError, Body, DayEvents, EventCell, EventFamily, EventKind, EventSearch, GeoLocation,
    HorizonState, LowPrecisionEphemeris, ModelEarthOrientation, TimePrecision,
};
use navalmanac::EphemerisSpan;
use std::sync::Arc;

fn low_precision() -> LowPrecisionEphemeris {
    LowPrecisionEphemeris::new(
        EphemerisSpan::De421,
        Arc::new(ModelEarthOrientation::default()),
    )
}

/// Crosses the moon threshold upward at 01:10 and 13:10, downward at 07:10 and 19:10.
fn twice_a_day() -> SineAltitude {
    SineAltitude {
        origin: date(2024, 3, 5).at_seconds(4200.0),
        period_s: 43_200.0,
        amplitude: 10.0,
        offset: MOON_THRESHOLD,
    }
}

#[test]
fn one_sunrise_and_sunset_outside_polar_circles() {
    let eph = low_precision();
    let search = EventSearch::new(&eph);
    for month in 1..=12 {
        let d = date(2024, month, 15);
        for &lat in STANDARD_LATITUDES.iter().filter(|l| l.abs() <= 64.0) {
            let obs = GeoLocation::on_greenwich(lat).unwrap();
            let day = search
                .search_day(
                    Body::Sun,
                    EventFamily::RiseSet,
                    d,
                    &obs,
                    TimePrecision::Minute,
                    HorizonState::Unknown,
                )
                .unwrap();
            assert_eq!(day.outcome.of_kind(EventKind::Sunrise).len(), 1, "{d} {lat}");
            assert_eq!(day.outcome.of_kind(EventKind::Sunset).len(), 1, "{d} {lat}");
        }
    }
}

#[test]
fn midnight_sun_and_polar_night_at_70n() {
    let eph = low_precision();
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(70.0).unwrap();

    let summer = search
        .search_day(
            Body::Sun,
            EventFamily::RiseSet,
            date(2024, 6, 21),
            &obs,
            TimePrecision::Minute,
            HorizonState::Unknown,
        )
        .unwrap();
    assert_eq!(summer.outcome, DayEvents::ContinuouslyAbove);

    let winter = search
        .search_day(
            Body::Sun,
            EventFamily::RiseSet,
            date(2024, 12, 21),
            &obs,
            TimePrecision::Minute,
            HorizonState::Unknown,
        )
        .unwrap();
    assert_eq!(winter.outcome, DayEvents::ContinuouslyBelow);

    let row = twilight_row(&search, date(2024, 12, 21), 70.0, TimePrecision::Minute).unwrap();
    assert_eq!(row.formatted()[2], "vv:vv");
    assert_eq!(row.formatted()[3], "vv:vv");
    // the Sun still reaches −3.4°: civil twilight occurs
    assert!(row.cells[1].is_time() && row.cells[4].is_time());
}

#[test]
fn repeated_search_is_deterministic() {
    let eph = low_precision();
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(52.0).unwrap();
    let run = || {
        search
            .ordered_events(
                Body::Moon,
                EventFamily::RiseSet,
                date(2024, 8, 1),
                5,
                &obs,
                TimePrecision::Second,
            )
            .unwrap()
    };
    let a = run();
    let b = run();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn double_moonrise_fills_secondary_cells() {
    let eph = twice_a_day();
    let search = EventSearch::new(&eph);
    let (row, days) = moon_rise_set(
        &search,
        date(2024, 3, 5),
        1,
        70.0,
        TimePrecision::Minute,
        HorizonState::Unknown,
    )
    .unwrap();

    assert_eq!(days[0].outcome.of_kind(EventKind::Moonrise).len(), 2);
    assert!(row.double_events);
    assert_eq!(row.primary[0].to_string(), "01:10");
    assert_eq!(row.secondary[0].to_string(), "13:10");
    assert_eq!(row.primary[1].to_string(), "07:10");
    assert_eq!(row.secondary[1].to_string(), "19:10");
}

#[test]
fn events_over_several_days_are_time_ordered() {
    let eph = twice_a_day();
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(70.0).unwrap();
    let events = search
        .ordered_events(
            Body::Moon,
            EventFamily::RiseSet,
            date(2024, 3, 5),
            2,
            &obs,
            TimePrecision::Second,
        )
        .unwrap();
    assert_eq!(events.len(), 8);
    let instants: Vec<f64> = events
        .iter()
        .map(|e| match e.time {
            EventTime::At(t) => t.to_mjd_utc_days(),
            EventTime::Indeterminate { .. } => panic!("unexpected indeterminate"),
        })
        .collect();
    assert!(instants.windows(2).all(|w| w[0] < w[1]));
    assert!(events[0].kind.is_rising());
}

#[test]
fn event_at_23_59_59_6_belongs_to_next_day() {
    let d = date(2024, 5, 10);
    let eph = RampAltitude {
        crossing: d.at_seconds(86_399.6),
        deg_per_s: 1.0 / 3600.0,
        offset: MOON_THRESHOLD,
    };
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(45.0).unwrap();

    let today = search
        .search_day(
            Body::Moon,
            EventFamily::RiseSet,
            d,
            &obs,
            TimePrecision::Second,
            HorizonState::Unknown,
        )
        .unwrap();
    assert!(today.outcome.of_kind(EventKind::Moonrise).is_empty());

    let tomorrow = search
        .search_day(
            Body::Moon,
            EventFamily::RiseSet,
            d.succ(),
            &obs,
            TimePrecision::Second,
            today.end_state,
        )
        .unwrap();
    let rises = tomorrow.outcome.of_kind(EventKind::Moonrise);
    assert_eq!(rises.len(), 1);
    let shown = rises[0].display.unwrap();
    assert_eq!(shown.date, d.succ());
    assert_eq!(shown.to_string(), "00:00:00");
    assert_eq!(cell_seconds(&rises[0].cell()), 0);
}

#[test]
fn carried_state_classifies_quiet_days() {
    let eph = ConstantAltitude(5.0);
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(80.0).unwrap();
    let days = search
        .find_events(
            Body::Moon,
            EventFamily::RiseSet,
            date(2024, 1, 1),
            3,
            &obs,
            TimePrecision::Minute,
        )
        .unwrap();
    assert!(days.iter().all(|d| d.outcome == DayEvents::ContinuouslyAbove));
    assert!(!days[0].used_carry);
    assert!(days[1].used_carry && days[2].used_carry);
    assert_eq!(
        days[0].outcome.cell(EventKind::Moonrise, 0),
        EventCell::AlwaysAbove
    );
}

#[test]
fn non_convergence_is_reported_as_indeterminate() {
    let eph = twice_a_day();
    let params = SearchParams {
        max_iterations: 2,
        ..SearchParams::default()
    };
    let search = EventSearch::with_params(&eph, params);
    let obs = GeoLocation::on_greenwich(70.0).unwrap();
    let day = search
        .search_day(
            Body::Moon,
            EventFamily::RiseSet,
            date(2024, 3, 5),
            &obs,
            TimePrecision::Minute,
            HorizonState::Unknown,
        )
        .unwrap();
    let events = day.outcome.events();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.is_indeterminate()));
    assert_eq!(
        day.outcome.cell(EventKind::Moonrise, 0).to_string(),
        "??:??"
    );
}

#[test]
fn broken_provider_fails_the_day() {
    let search = EventSearch::new(&NanAltitude);
    let obs = GeoLocation::on_greenwich(10.0).unwrap();
    let res = search.search_day(
        Body::Sun,
        EventFamily::RiseSet,
        date(2024, 1, 1),
        &obs,
        TimePrecision::Minute,
        HorizonState::Unknown,
    );
    assert!(matches!(res, Err(AlmanacError::EphemerisFailure(_))));
}

#[test]
fn out_of_span_year_is_rejected() {
    let eph = low_precision();
    let search = EventSearch::new(&eph);
    let obs = GeoLocation::on_greenwich(10.0).unwrap();
    let res = search.search_day(
        Body::Sun,
        EventFamily::RiseSet,
        date(2051, 1, 1),
        &obs,
        TimePrecision::Minute,
        HorizonState::Unknown,
    );
    assert_eq!(
        res.unwrap_err(),
        AlmanacError::EphemerisOutOfRange {
            year: 2051,
            min: 1900,
            max: 2050
        }
    );
}
