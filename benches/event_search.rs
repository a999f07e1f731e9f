use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use navalmanac::{
    constants::STANDARD_LATITUDES,
    run::LatitudeWorker,
    search::{moonrise::moon_rise_set, twilight::twilight_row},
    CalendarDate, EphemerisSpan, EventSearch, HorizonState, LowPrecisionEphemeris,
    ModelEarthOrientation, TimePrecision,
};

fn ephemeris() -> LowPrecisionEphemeris {
    LowPrecisionEphemeris::new(
        EphemerisSpan::De421,
        Arc::new(ModelEarthOrientation::default()),
    )
}

/// Twilight row (three Sun searches) at every tabulated latitude for one date.
fn bench_twilight_rows(c: &mut Criterion) {
    let eph = ephemeris();
    let search = EventSearch::new(&eph);
    let date = CalendarDate::new(2025, 3, 14).unwrap();

    c.bench_function("event_search/twilight_rows_31_latitudes", |b| {
        b.iter(|| {
            for &lat in STANDARD_LATITUDES.iter() {
                let row = twilight_row(&search, black_box(date), lat, TimePrecision::Minute)
                    .unwrap();
                black_box(row);
            }
        })
    });
}

/// Moonrise/moonset row of a 3-day page, minute and second precision.
fn bench_moon_rows(c: &mut Criterion) {
    let eph = ephemeris();
    let search = EventSearch::new(&eph);
    let first = CalendarDate::new(2025, 3, 14).unwrap();

    for (name, precision) in [
        ("event_search/moon_row_minute", TimePrecision::Minute),
        ("event_search/moon_row_second", TimePrecision::Second),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let (row, _) = moon_rise_set(
                    &search,
                    black_box(first),
                    3,
                    52.0,
                    precision,
                    HorizonState::Unknown,
                )
                .unwrap();
                black_box(row);
            })
        });
    }
}

/// Full page rows of one latitude worker, cold cache each time.
fn bench_worker_page(c: &mut Criterion) {
    let eph = ephemeris();
    let search = EventSearch::new(&eph);
    let first = CalendarDate::new(2025, 6, 20).unwrap();

    c.bench_function("event_search/worker_page_rows_66N", |b| {
        b.iter_batched(
            || LatitudeWorker::new(66.0).unwrap(),
            |mut worker| {
                let rows = worker
                    .page_rows(&search, first, 3, TimePrecision::Minute)
                    .unwrap();
                black_box(rows);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_twilight_rows,
    bench_moon_rows,
    bench_worker_page
);
criterion_main!(benches);
