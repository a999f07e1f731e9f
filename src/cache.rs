//! # Transient result cache
//!
//! Memoises per-(date, latitude, body, event family) results within one run.
//!
//! ## Scope
//! -----------------
//! A [`TransientCache`] is owned by exactly one worker (see
//! [`LatitudeWorker`](crate::run::LatitudeWorker)) or by one sampler, and dropped with it at
//! the end of the run. It is never shared across threads and never persisted, so it needs
//! no synchronisation: the work partitioning guarantees that two workers never compute
//! the same key.
//!
//! ## Accounting
//! -----------------
//! * a **miss** runs the computation once and stores its result,
//! * a **hit** returns a clone of the stored value,
//! * a failed computation is counted as a miss and **not** stored.
//!
//! Counters are informational; they are aggregated into
//! [`RunStats`](crate::run::RunStats).

use std::{fmt, hash::Hash};

use ahash::HashMap;
use serde::{Deserialize, Serialize};

use crate::{bodies::Body, time::CalendarDate};

/// Kind of result stored under a [`CacheKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheFamily {
    HourlySamples,
    RiseSet,
    CivilTwilight,
    NauticalTwilight,
    Transit,
}

/// Key of a cached result.
///
/// `latitude_mdeg` is the latitude in thousandths of a degree, or `None` for geocentric
/// quantities (hourly samples, transits at Greenwich).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub date: CalendarDate,
    pub latitude_mdeg: Option<i32>,
    pub body: Body,
    pub family: CacheFamily,
}

impl CacheKey {
    pub fn geocentric(date: CalendarDate, body: Body, family: CacheFamily) -> Self {
        CacheKey {
            date,
            latitude_mdeg: None,
            body,
            family,
        }
    }

    pub fn at_latitude(date: CalendarDate, latitude: f64, body: Body, family: CacheFamily) -> Self {
        CacheKey {
            date,
            latitude_mdeg: Some((latitude * 1000.0).round() as i32),
            body,
            family,
        }
    }
}

/// Snapshot of the counters of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.entries += other.entries;
    }

    /// Fraction of lookups served from the cache, 0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} entries={} ({:.1}% hit)",
            self.hits,
            self.misses,
            self.entries,
            100.0 * self.hit_ratio()
        )
    }
}

/// Single-owner memoisation table.
#[derive(Debug, Clone)]
pub struct TransientCache<K, V> {
    store: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for TransientCache<K, V> {
    fn default() -> Self {
        TransientCache {
            store: HashMap::default(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: Eq + Hash, V: Clone> TransientCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing and storing it on first request.
    ///
    /// Arguments
    /// -----------------
    /// * `key`: lookup key.
    /// * `compute`: invoked at most once per key, and only on a miss.
    ///
    /// Return
    /// ----------
    /// * The value, or the error of `compute` (in which case nothing is stored).
    pub fn get_or_compute<E, F>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.store.get(&key) {
            self.hits += 1;
            return Ok(v.clone());
        }
        self.misses += 1;
        let v = compute()?;
        self.store.insert(key, v.clone());
        Ok(v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.store.len(),
        }
    }

    /// Drop all entries and reset the counters.
    pub fn clear(&mut self) {
        self.store.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
