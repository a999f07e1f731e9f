use std::{fmt, time::Duration};

use crate::{cache::CacheStats, search::moonrise::MoonSeekStats};

use super::{progress::format_elapsed, worker::WorkerStats};

/// Statistics of a run, aggregated over all latitude workers.
///
/// `{}` prints a one-line summary, `{:#}` one line per group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub pages: u64,
    pub days: u64,
    pub workers: usize,
    pub wall_time: Duration,
    /// Sum over workers of the time spent in event searches
    pub search_time: Duration,
    pub searches: u64,
    pub moon: MoonSeekStats,
    /// Day-search caches of the latitude workers
    pub event_cache: CacheStats,
    /// Hourly-sample cache of the sampler
    pub sample_cache: CacheStats,
}

impl RunStats {
    pub fn add_worker(&mut self, stats: &WorkerStats, cache: &CacheStats) {
        self.search_time += stats.search_time;
        self.searches += stats.searches;
        self.moon.merge(&stats.moon);
        self.event_cache.merge(cache);
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(
                f,
                "pages: {} ({} days) on {} worker(s) in {}",
                self.pages,
                self.days,
                self.workers,
                format_elapsed(self.wall_time)
            )?;
            writeln!(
                f,
                "event searches: {} in {}",
                self.searches,
                format_elapsed(self.search_time)
            )?;
            writeln!(
                f,
                "moon: {} days, {} with data, horizon seeks {} ({} from carry), {} indeterminate",
                self.moon.moon_days,
                self.moon.moon_data_found,
                self.moon.horizon_seeks,
                self.moon.horizon_found,
                self.moon.indeterminate
            )?;
            writeln!(f, "event cache: {}", self.event_cache)?;
            write!(f, "sample cache: {}", self.sample_cache)
        } else {
            write!(
                f,
                "{} pages, {} days, {} searches in {}, moon days {}, cache {}",
                self.pages,
                self.days,
                self.searches,
                format_elapsed(self.search_time),
                self.moon.moon_days,
                self.event_cache
            )
        }
    }
}

#[cfg(test)]
mod stats_test {
    use super::*;

    #[test]
    fn test_aggregate_and_display() {
        let mut stats = RunStats {
            pages: 2,
            days: 6,
            workers: 1,
            ..RunStats::default()
        };
        let w = WorkerStats {
            search_time: Duration::from_millis(42),
            searches: 3,
            moon: MoonSeekStats {
                moon_days: 6,
                ..MoonSeekStats::default()
            },
        };
        let cache = CacheStats {
            hits: 1,
            misses: 3,
            entries: 3,
        };
        stats.add_worker(&w, &cache);
        stats.add_worker(&w, &cache);
        assert_eq!(stats.searches, 6);
        assert_eq!(stats.moon.moon_days, 12);
        assert_eq!(
            stats.to_string(),
            "2 pages, 6 days, 6 searches in 84 ms, moon days 12, cache hits=2 misses=6 entries=6 (25.0% hit)"
        );
        assert_eq!(format!("{stats:#}").lines().count(), 5);
    }
}
