mod common;

use std::sync::Arc;

use common::date;
use navalmanac::{
    distributor::{ParallelDistributor, SerialDistributor},
    run::LatitudeWorker,
    search::moonrise::layout_row,
    AlmanacConfig, AlmanacError, AlmanacRun, Body, DaySpan, EphemerisSpan, EventFamily,
    EventSearch, GeoLocation, HorizonState, LowPrecisionEphemeris, ModelEarthOrientation,
    TimePrecision, WorkDistributor,
};

fn start_run(parallel: bool) -> AlmanacRun {
    let config = AlmanacConfig::builder()
        .parallel(parallel)
        .max_workers(4)
        .build()
        .unwrap();
    let eop = Arc::new(ModelEarthOrientation::default());
    let ephemeris = Arc::new(LowPrecisionEphemeris::new(config.ephemeris_span, eop.clone()));
    AlmanacRun::new(config, ephemeris, eop).unwrap()
}

#[test]
fn worker_carry_matches_serial_search() {
    let eph = LowPrecisionEphemeris::new(
        EphemerisSpan::De421,
        Arc::new(ModelEarthOrientation::default()),
    );
    let search = EventSearch::new(&eph);
    let latitudes = [50.0, 10.0, -30.0];
    let first = date(2024, 3, 1);
    let days = 10;

    let expected: Vec<_> = latitudes
        .iter()
        .map(|&lat| {
            let obs = GeoLocation::on_greenwich(lat).unwrap();
            search
                .find_events(
                    Body::Moon,
                    EventFamily::RiseSet,
                    first,
                    days,
                    &obs,
                    TimePrecision::Minute,
                )
                .unwrap()
        })
        .collect();

    let pool = ParallelDistributor::new(3).unwrap();
    let mut workers = workers_at(&latitudes);

    for i in 0..days {
        let d = first.add_days(i as i64);
        let got = pool
            .map_mut(&mut workers, |w| {
                w.moon_day(&search, d, TimePrecision::Minute)
            })
            .unwrap();
        for (k, day) in got.iter().enumerate() {
            assert_eq!(day.outcome, expected[k][i].outcome, "{d} at {}", latitudes[k]);
            assert_eq!(day.end_state, expected[k][i].end_state);
        }
    }
    for (k, w) in workers.iter().enumerate() {
        assert_eq!(w.moon_state(), expected[k][days - 1].end_state);
        assert_eq!(w.stats().moon.moon_days, days as u64);
    }
}

fn workers_at(latitudes: &[f64]) -> Vec<LatitudeWorker> {
    latitudes
        .iter()
        .map(|&lat| LatitudeWorker::new(lat).unwrap())
        .collect()
}

#[test]
fn three_day_chunks_match_serial_search_near_the_pole() {
    let eph = LowPrecisionEphemeris::new(
        EphemerisSpan::De421,
        Arc::new(ModelEarthOrientation::default()),
    );
    let search = EventSearch::new(&eph);
    let latitudes = [72.0, 50.0, -60.0];
    let chunks = 10;

    for first in [date(2025, 1, 1), date(2025, 6, 1)] {
        let expected: Vec<_> = latitudes
            .iter()
            .map(|&lat| {
                let obs = GeoLocation::on_greenwich(lat).unwrap();
                search
                    .find_events(
                        Body::Moon,
                        EventFamily::RiseSet,
                        first,
                        3 * chunks,
                        &obs,
                        TimePrecision::Minute,
                    )
                    .unwrap()
            })
            .collect();
        // quiet days at 72° are classified from the carried state
        assert!(expected[0].iter().any(|d| d.used_carry), "{first}");

        let pool = ParallelDistributor::new(3).unwrap();
        let mut workers = workers_at(&latitudes);
        for c in 0..chunks {
            let start = first.add_days(3 * c as i64);
            let rows = pool
                .map_mut(&mut workers, |w| {
                    w.moon_row(&search, start, 3, TimePrecision::Minute)
                })
                .unwrap();
            for (k, row) in rows.iter().enumerate() {
                let days = &expected[k][3 * c..3 * c + 3];
                let carry_in = if c == 0 {
                    HorizonState::Unknown
                } else {
                    expected[k][3 * c - 1].end_state
                };
                assert_eq!(
                    *row,
                    layout_row(start, latitudes[k], days, carry_in),
                    "{start} at {}",
                    latitudes[k]
                );
                assert_eq!(row.carry, days[2].end_state);
            }
        }
        for (k, w) in workers.iter().enumerate() {
            assert_eq!(w.moon_state(), expected[k][3 * chunks - 1].end_state);
            assert_eq!(w.stats().moon.moon_days, 3 * chunks as u64);
        }
    }
}

#[test]
fn serial_and_parallel_pools_give_identical_rows() {
    let eph = LowPrecisionEphemeris::new(
        EphemerisSpan::De421,
        Arc::new(ModelEarthOrientation::default()),
    );
    let search = EventSearch::new(&eph);
    let first = date(2024, 7, 14);
    let latitudes = [60.0, 35.0, 0.0, -45.0];

    let mut serial_workers = workers_at(&latitudes);
    let serial = SerialDistributor
        .map_mut(&mut serial_workers, |w| {
            w.page_rows(&search, first, 3, TimePrecision::Minute)
        })
        .unwrap();

    let mut parallel_workers = workers_at(&latitudes);
    let parallel = ParallelDistributor::new(4)
        .unwrap()
        .map_mut(&mut parallel_workers, |w| {
            w.page_rows(&search, first, 3, TimePrecision::Minute)
        })
        .unwrap();

    assert_eq!(serial, parallel);
    assert_eq!(serial[1].latitude, 35.0);
}

#[test]
fn repeated_page_is_served_from_the_worker_caches() {
    let mut run = start_run(false);
    let first = date(2024, 2, 10);

    let a = run.event_time_page(first, 2).unwrap();
    let after_first = run.stats();
    let b = run.event_time_page(first, 2).unwrap();
    let after_second = run.stats();

    assert_eq!(a.latitudes, b.latitudes);
    assert_eq!(after_first.searches, after_second.searches);
    assert!(after_second.event_cache.hits > after_first.event_cache.hits);
    assert_eq!(after_second.pages, 2);
    assert_eq!(after_second.days, 4);
}

#[test]
fn invalid_latitude_list_is_rejected() {
    let res = AlmanacConfig::builder()
        .latitudes(vec![10.0, 20.0])
        .build();
    assert_eq!(res.unwrap_err(), AlmanacError::InvalidLatitudeList(2));
}

#[test]
fn year_outside_ephemeris_is_rejected_before_work() {
    let mut run = start_run(true);
    let res = run.nautical_pages(DaySpan::Year(2051));
    assert!(matches!(
        res,
        Err(AlmanacError::EphemerisOutOfRange { year: 2051, .. })
    ));
    let stats = run.finish();
    assert_eq!(stats.pages, 0);
    assert_eq!(stats.searches, 0);
}

#[test]
fn nautical_page_is_complete() {
    let mut run = start_run(true);
    let pages = run
        .nautical_pages(DaySpan::Days {
            first: date(2024, 6, 20),
            count: 3,
        })
        .unwrap();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];

    assert_eq!(page.dates.len(), 3);
    assert_eq!(page.sun.len(), 3);
    assert_eq!(page.moon.len(), 3);
    assert_eq!(page.aries.len(), 3);
    assert!(page.planets.iter().all(|p| p.len() == 4));
    assert_eq!(page.stars.len(), 57);
    assert_eq!(page.planet_passages.len(), 4);
    assert_eq!(page.equation_of_time.len(), 3);

    assert_eq!(page.latitudes.len(), 31);
    assert_eq!(page.latitudes[0].latitude, 72.0);
    for rows in &page.latitudes {
        assert_eq!(rows.twilight.len(), 3);
        assert_eq!(rows.moon.primary.len(), 6);
        assert_eq!(rows.moon.secondary.len(), 6);
    }
    // midnight sun at 72°N around the solstice
    assert_eq!(page.latitudes[0].twilight[0].formatted()[2], "^^:^^");

    let stats = run.finish();
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.days, 3);
    assert_eq!(stats.moon.moon_days, 31 * 3);
}
