use std::time::{Duration, Instant};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    cache::{CacheFamily, CacheKey, CacheStats, TransientCache},
    observer::GeoLocation,
    search::{
        moonrise::{layout_row, MoonRiseSetRow, MoonSeekStats},
        twilight::{assemble_row, TwilightRow, TWILIGHT_FAMILIES},
        DaySearch, EventFamily, EventSearch, HorizonState,
    },
    time::{CalendarDate, TimePrecision},
};

use super::progress::format_elapsed;

/// Counters of one latitude worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Time spent inside event searches (cache misses only)
    pub search_time: Duration,
    /// Number of day searches actually run
    pub searches: u64,
    pub moon: MoonSeekStats,
}

impl WorkerStats {
    pub fn merge(&mut self, other: &WorkerStats) {
        self.search_time += other.search_time;
        self.searches += other.searches;
        self.moon.merge(&other.moon);
    }
}

/// Rows of one latitude for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatitudeRows {
    pub latitude: f64,
    /// One twilight row per date of the page
    pub twilight: Vec<TwilightRow>,
    pub moon: MoonRiseSetRow,
}

fn cache_family(family: EventFamily) -> CacheFamily {
    match family {
        EventFamily::RiseSet => CacheFamily::RiseSet,
        EventFamily::CivilTwilight => CacheFamily::CivilTwilight,
        EventFamily::NauticalTwilight => CacheFamily::NauticalTwilight,
        EventFamily::Transit => CacheFamily::Transit,
    }
}

/// Owner of everything that belongs to one tabulated latitude during a run: the moon
/// carry state, the transient cache of day searches and the statistics.
///
/// A worker is handed to exactly one task per batch, so none of its state is shared.
#[derive(Debug)]
pub struct LatitudeWorker {
    latitude: f64,
    observer: GeoLocation,
    moon_state: HorizonState,
    last_moon_date: Option<CalendarDate>,
    cache: TransientCache<(CacheKey, TimePrecision), DaySearch>,
    stats: WorkerStats,
}

impl LatitudeWorker {
    pub fn new(latitude: f64) -> Result<Self, AlmanacError> {
        Ok(LatitudeWorker {
            latitude,
            observer: GeoLocation::on_greenwich(latitude)?,
            moon_state: HorizonState::Unknown,
            last_moon_date: None,
            cache: TransientCache::new(),
            stats: WorkerStats::default(),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Moon state at the end of the last date processed.
    pub fn moon_state(&self) -> HorizonState {
        self.moon_state
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Day search through the worker's cache.
    pub fn cached_day(
        &mut self,
        search: &EventSearch<'_>,
        body: Body,
        family: EventFamily,
        date: CalendarDate,
        precision: TimePrecision,
        carry: HorizonState,
    ) -> Result<DaySearch, AlmanacError> {
        let key = (
            CacheKey::at_latitude(date, self.latitude, body, cache_family(family)),
            precision,
        );
        let observer = self.observer;
        let stats = &mut self.stats;
        self.cache.get_or_compute(key, || {
            let start = Instant::now();
            let day = search.search_day(body, family, date, &observer, precision, carry);
            stats.search_time += start.elapsed();
            stats.searches += 1;
            day
        })
    }

    pub fn twilight_row(
        &mut self,
        search: &EventSearch<'_>,
        date: CalendarDate,
        precision: TimePrecision,
    ) -> Result<TwilightRow, AlmanacError> {
        let mut outcomes = Vec::with_capacity(TWILIGHT_FAMILIES.len());
        for (family, _, _) in TWILIGHT_FAMILIES {
            let day = self.cached_day(
                search,
                Body::Sun,
                family,
                date,
                precision,
                HorizonState::Unknown,
            )?;
            outcomes.push(day.outcome);
        }
        Ok(assemble_row(date, self.latitude, &outcomes))
    }

    /// Moonrise/moonset search of one date with the carried state.
    ///
    /// The carry is reset to [`HorizonState::Unknown`] unless `date` follows the last
    /// date this worker searched.
    pub fn moon_day(
        &mut self,
        search: &EventSearch<'_>,
        date: CalendarDate,
        precision: TimePrecision,
    ) -> Result<DaySearch, AlmanacError> {
        if self.last_moon_date != Some(date.pred()) {
            self.moon_state = HorizonState::Unknown;
        }
        let day = self.cached_day(
            search,
            Body::Moon,
            EventFamily::RiseSet,
            date,
            precision,
            self.moon_state,
        )?;
        self.stats.moon.record(&day);
        self.moon_state = day.end_state;
        self.last_moon_date = Some(date);
        Ok(day)
    }

    pub fn moon_row(
        &mut self,
        search: &EventSearch<'_>,
        first: CalendarDate,
        days: usize,
        precision: TimePrecision,
    ) -> Result<MoonRiseSetRow, AlmanacError> {
        let carry_in = if self.last_moon_date == Some(first.pred()) {
            self.moon_state
        } else {
            HorizonState::Unknown
        };
        let per_day = (0..days as i64)
            .map(|i| self.moon_day(search, first.add_days(i), precision))
            .collect::<Result<Vec<_>, _>>()?;
        let row = layout_row(first, self.latitude, &per_day, carry_in);
        if row.double_events {
            debug!("double moon event at {}° from {first}", self.latitude);
        }
        Ok(row)
    }

    /// Twilight rows and the moonrise/moonset row of a page.
    pub fn page_rows(
        &mut self,
        search: &EventSearch<'_>,
        first: CalendarDate,
        days: usize,
        precision: TimePrecision,
    ) -> Result<LatitudeRows, AlmanacError> {
        let start = Instant::now();
        let twilight = (0..days as i64)
            .map(|i| self.twilight_row(search, first.add_days(i), precision))
            .collect::<Result<Vec<_>, _>>()?;
        let moon = self.moon_row(search, first, days, precision)?;
        debug!(
            "latitude {:+.1}° {first} (+{days}d) in {}",
            self.latitude,
            format_elapsed(start.elapsed())
        );
        Ok(LatitudeRows {
            latitude: self.latitude,
            twilight,
            moon,
        })
    }
}

#[cfg(test)]
mod worker_test {
    use super::*;
    use crate::unit_test_global::LOW_PRECISION;

    #[test]
    fn test_repeated_moon_day_hits_cache_once() {
        let search = EventSearch::new(&*LOW_PRECISION);
        let mut worker = LatitudeWorker::new(50.0).unwrap();
        let date = CalendarDate::new(2024, 4, 2).unwrap();

        let a = worker.moon_day(&search, date, TimePrecision::Minute).unwrap();
        let b = worker.moon_day(&search, date, TimePrecision::Minute).unwrap();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(worker.cache_stats().hits, 1);
        assert_eq!(worker.cache_stats().misses, 1);
        assert_eq!(worker.stats().searches, 1);
    }

    #[test]
    fn test_carry_resets_on_gap() {
        let search = EventSearch::new(&*LOW_PRECISION);
        let mut worker = LatitudeWorker::new(50.0).unwrap();
        let first = CalendarDate::new(2024, 4, 2).unwrap();
        let row = worker
            .moon_row(&search, first, 3, TimePrecision::Minute)
            .unwrap();
        assert_eq!(row.days(), 3);
        assert_eq!(row.carry, worker.moon_state());
        assert_ne!(worker.moon_state(), HorizonState::Unknown);

        let rows = worker
            .page_rows(&search, first.add_days(10), 2, TimePrecision::Minute)
            .unwrap();
        assert_eq!(rows.twilight.len(), 2);
        assert_eq!(rows.moon.primary.len(), 4);
        assert_eq!(worker.stats().moon.moon_days, 5);
    }
}
