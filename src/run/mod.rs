//! # Almanac run
//!
//! An [`AlmanacRun`] is the context of one table-generation invocation. It owns
//!
//! * the validated [`AlmanacConfig`],
//! * the shared ephemeris and Earth-orientation collaborators,
//! * the [`ObservableSampler`] and its cache,
//! * the work [`Distributor`] (its pool lives as long as the run),
//! * one [`LatitudeWorker`] per tabulated latitude, each with its own carry state,
//!   cache and statistics.
//!
//! Pages are built one after another. For each page the latitude workers are handed to
//! the distributor as one batch; the rows come back in latitude order.
//!
//! ## Pages
//! -----------------
//! * [`NauticalPage`]: 3 dates, hourly observables of the Sun, Moon, planets and Aries,
//!   star places, planet meridian passages, the equation-of-time section, and twilight
//!   and moonrise/moonset rows at the configured precision.
//! * [`EventTimePage`]: 2 dates, twilight and moonrise/moonset rows to the second plus
//!   the Moon's meridian passages.
//!
//! A run over a span whose years fall outside the ephemeris span is rejected before
//! any computation.

pub mod progress;
pub mod stats;
pub mod worker;

use std::{sync::Arc, time::Instant};

use log::{debug, info};

use crate::{
    almanac_errors::AlmanacError,
    bodies::{Body, PLANETS},
    config::{AlmanacConfig, PaperSize, TableStyle},
    constants::{Degree, EVENT_TIME_DAYS_PER_PAGE, NAUTICAL_DAYS_PER_PAGE},
    distributor::{Distributor, WorkDistributor},
    ephemeris::{EarthOrientation, EphemerisProvider},
    format::DeclinationFormat,
    sampler::{HourlySampleSet, MoonObservables, ObservableSampler, PlanetObservables, StarPlace},
    search::{
        root_finding::SearchParams,
        transit::{equation_of_time_row, meridian_transit, EquationOfTimeRow, MeridianPassage},
        EventSearch,
    },
    time::{CalendarDate, TimePrecision},
};

use self::progress::{format_elapsed, PageProgress};

pub use self::{
    stats::RunStats,
    worker::{LatitudeRows, LatitudeWorker, WorkerStats},
};

/// Dates covered by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySpan {
    Days { first: CalendarDate, count: usize },
    Month { year: i32, month: u8 },
    Year(i32),
}

impl DaySpan {
    /// First date and number of dates.
    pub fn resolve(&self) -> Result<(CalendarDate, usize), AlmanacError> {
        match *self {
            DaySpan::Days { count: 0, .. } => {
                Err(AlmanacError::InvalidDate("empty day span".into()))
            }
            DaySpan::Days { first, count } => Ok((first, count)),
            DaySpan::Month { year, month } => {
                let first = CalendarDate::new(year, month, 1)?;
                let next = if month == 12 {
                    CalendarDate::new(year + 1, 1, 1)?
                } else {
                    CalendarDate::new(year, month + 1, 1)?
                };
                Ok((first, first.days_until(next) as usize))
            }
            DaySpan::Year(year) => {
                let first = CalendarDate::new(year, 1, 1)?;
                Ok((first, first.days_until(CalendarDate::new(year + 1, 1, 1)?) as usize))
            }
        }
    }
}

fn page_dates(first: CalendarDate, days: usize) -> Result<Vec<CalendarDate>, AlmanacError> {
    if days == 0 {
        return Err(AlmanacError::InvalidDate(format!("empty page at {first}")));
    }
    Ok((0..days as i64).map(|i| first.add_days(i)).collect())
}

/// Presentation settings forwarded untouched to the page consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStyle {
    pub table_style: TableStyle,
    pub declination_format: DeclinationFormat,
    pub paper: PaperSize,
}

/// Data of one nautical almanac page.
#[derive(Debug, Clone)]
pub struct NauticalPage {
    pub dates: Vec<CalendarDate>,
    pub style: PageStyle,
    /// DUT1 (s) at 00h of the first date
    pub dut1: f64,
    /// ΔT (s) at 00h of the first date
    pub delta_t: f64,
    pub sun: Vec<Arc<HourlySampleSet>>,
    pub moon: Vec<MoonObservables>,
    pub aries: Vec<[Degree; 24]>,
    /// Per date, Venus, Mars, Jupiter and Saturn
    pub planets: Vec<Vec<PlanetObservables>>,
    /// Star places at 00h of the middle date
    pub stars: Vec<StarPlace>,
    /// Planet passages on the middle date
    pub planet_passages: Vec<MeridianPassage>,
    pub equation_of_time: Vec<EquationOfTimeRow>,
    /// One entry per latitude, in configuration order
    pub latitudes: Vec<LatitudeRows>,
}

/// Data of one event-time page.
#[derive(Debug, Clone)]
pub struct EventTimePage {
    pub dates: Vec<CalendarDate>,
    pub style: PageStyle,
    pub dut1: f64,
    pub delta_t: f64,
    pub moon_passages: Vec<MeridianPassage>,
    pub latitudes: Vec<LatitudeRows>,
}

/// Context of one almanac run.
#[derive(Debug)]
pub struct AlmanacRun {
    config: AlmanacConfig,
    ephemeris: Arc<dyn EphemerisProvider>,
    eop: Arc<dyn EarthOrientation>,
    params: SearchParams,
    sampler: ObservableSampler,
    distributor: Distributor,
    workers: Vec<LatitudeWorker>,
    started: Instant,
    pages: u64,
    days: u64,
}

impl AlmanacRun {
    /// Start a run: build the workers and the distributor.
    ///
    /// Arguments
    /// -----------------
    /// * `config`: validated configuration.
    /// * `ephemeris`: apparent-place provider shared by all workers.
    /// * `eop`: Earth-orientation collaborator.
    ///
    /// Return
    /// ----------
    /// * The run, or an error when a latitude is invalid or the pool cannot be built.
    pub fn new(
        config: AlmanacConfig,
        ephemeris: Arc<dyn EphemerisProvider>,
        eop: Arc<dyn EarthOrientation>,
    ) -> Result<Self, AlmanacError> {
        let workers = config
            .latitudes
            .iter()
            .map(|&lat| LatitudeWorker::new(lat))
            .collect::<Result<Vec<_>, _>>()?;
        let distributor = Distributor::from_config(&config)?;
        let sampler = ObservableSampler::new(ephemeris.clone(), config.event_precision);
        info!(
            "almanac run: {} latitudes, {} worker(s), ephemeris {:?}",
            workers.len(),
            distributor.workers(),
            config.ephemeris_span
        );
        Ok(AlmanacRun {
            config,
            ephemeris,
            eop,
            params: SearchParams::default(),
            sampler,
            distributor,
            workers,
            started: Instant::now(),
            pages: 0,
            days: 0,
        })
    }

    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    pub fn config(&self) -> &AlmanacConfig {
        &self.config
    }

    pub fn workers(&self) -> &[LatitudeWorker] {
        &self.workers
    }

    pub fn sampler(&mut self) -> &mut ObservableSampler {
        &mut self.sampler
    }

    fn style(&self) -> PageStyle {
        PageStyle {
            table_style: self.config.table_style,
            declination_format: self.config.declination_format,
            paper: self.config.paper,
        }
    }

    /// Reject dates outside the configured span or the provider's coverage.
    pub fn check_span(&self, first: CalendarDate, last: CalendarDate) -> Result<(), AlmanacError> {
        for year in [first.year, last.year] {
            self.config.ephemeris_span.check_year(year)?;
            self.ephemeris.check_year(year)?;
        }
        Ok(())
    }

    /// `(DUT1, ΔT)` in seconds at 00h of `date`.
    pub fn dut1_deltat(&self, date: CalendarDate) -> (f64, f64) {
        self.eop.dut1_deltat(date.midnight())
    }

    /// Twilight and moon rows of every latitude for `days` dates from `first`, as one batch.
    pub fn latitude_rows(
        &mut self,
        first: CalendarDate,
        days: usize,
        precision: TimePrecision,
    ) -> Result<Vec<LatitudeRows>, AlmanacError> {
        let search = EventSearch::with_params(self.ephemeris.as_ref(), self.params);
        let start = Instant::now();
        let rows = self.distributor.map_mut(&mut self.workers, |w| {
            w.page_rows(&search, first, days, precision)
        })?;
        debug!(
            "{} latitude rows from {first} in {}",
            rows.len(),
            format_elapsed(start.elapsed())
        );
        Ok(rows)
    }

    /// Build the nautical page of `days` dates from `first`.
    pub fn nautical_page(
        &mut self,
        first: CalendarDate,
        days: usize,
    ) -> Result<NauticalPage, AlmanacError> {
        let dates = page_dates(first, days)?;
        let middle = dates[dates.len() / 2];

        let mut sun = Vec::with_capacity(days);
        let mut moon = Vec::with_capacity(days);
        let mut aries = Vec::with_capacity(days);
        let mut planets = Vec::with_capacity(days);
        let mut equation_of_time = Vec::with_capacity(days);
        for &date in &dates {
            sun.push(self.sampler.sun_observables(date)?);
            moon.push(self.sampler.moon_observables(date)?);
            aries.push(self.sampler.aries(date)?);
            planets.push(
                PLANETS
                    .iter()
                    .map(|&p| self.sampler.planet_observables(p, date))
                    .collect::<Result<Vec<_>, _>>()?,
            );
            equation_of_time.push(equation_of_time_row(&mut self.sampler, date)?);
        }
        let stars = self.sampler.star_places(middle)?;

        let planet_passages = {
            let search = EventSearch::with_params(self.ephemeris.as_ref(), self.params);
            PLANETS
                .iter()
                .map(|&p| meridian_transit(&search, p, middle, TimePrecision::Minute))
                .collect::<Result<Vec<_>, _>>()?
        };

        let latitudes = self.latitude_rows(first, days, self.config.event_precision)?;
        let (dut1, delta_t) = self.dut1_deltat(first);

        self.pages += 1;
        self.days += days as u64;
        Ok(NauticalPage {
            dates,
            style: self.style(),
            dut1,
            delta_t,
            sun,
            moon,
            aries,
            planets,
            stars,
            planet_passages,
            equation_of_time,
            latitudes,
        })
    }

    /// Build the event-time page of `days` dates from `first`.
    pub fn event_time_page(
        &mut self,
        first: CalendarDate,
        days: usize,
    ) -> Result<EventTimePage, AlmanacError> {
        let dates = page_dates(first, days)?;
        let moon_passages = {
            let search = EventSearch::with_params(self.ephemeris.as_ref(), self.params);
            dates
                .iter()
                .map(|&d| meridian_transit(&search, Body::Moon, d, TimePrecision::Second))
                .collect::<Result<Vec<_>, _>>()?
        };
        let latitudes = self.latitude_rows(first, days, TimePrecision::Second)?;
        let (dut1, delta_t) = self.dut1_deltat(first);

        self.pages += 1;
        self.days += days as u64;
        Ok(EventTimePage {
            dates,
            style: self.style(),
            dut1,
            delta_t,
            moon_passages,
            latitudes,
        })
    }

    /// Nautical pages (3 dates each, the last one possibly shorter) covering `span`.
    pub fn nautical_pages(&mut self, span: DaySpan) -> Result<Vec<NauticalPage>, AlmanacError> {
        self.paginate(span, NAUTICAL_DAYS_PER_PAGE, "nautical", Self::nautical_page)
    }

    /// Event-time pages (2 dates each, the last one possibly shorter) covering `span`.
    pub fn event_time_pages(&mut self, span: DaySpan) -> Result<Vec<EventTimePage>, AlmanacError> {
        self.paginate(span, EVENT_TIME_DAYS_PER_PAGE, "event-time", Self::event_time_page)
    }

    fn paginate<P, F>(
        &mut self,
        span: DaySpan,
        per_page: usize,
        label: &'static str,
        mut build: F,
    ) -> Result<Vec<P>, AlmanacError>
    where
        F: FnMut(&mut Self, CalendarDate, usize) -> Result<P, AlmanacError>,
    {
        let (first, count) = span.resolve()?;
        self.check_span(first, first.add_days(count as i64 - 1))?;
        info!("{label} pages: {count} days from {first}");

        let n_pages = count.div_ceil(per_page);
        let mut progress = PageProgress::new(label, n_pages as u64);
        let mut pages = Vec::with_capacity(n_pages);
        for p in 0..n_pages {
            let offset = p * per_page;
            let page_first = first.add_days(offset as i64);
            pages.push(build(self, page_first, per_page.min(count - offset))?);
            progress.page_done(page_first);
        }
        progress.finish();
        Ok(pages)
    }

    /// Statistics so far.
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            pages: self.pages,
            days: self.days,
            workers: self.distributor.workers(),
            wall_time: self.started.elapsed(),
            sample_cache: self.sampler.cache_stats(),
            ..RunStats::default()
        };
        for w in &self.workers {
            stats.add_worker(w.stats(), &w.cache_stats());
        }
        stats
    }

    /// End the run, tearing the pool down, and report its statistics.
    pub fn finish(self) -> RunStats {
        let stats = self.stats();
        info!("almanac run finished: {stats}");
        debug!("run statistics:\n{stats:#}");
        stats
    }
}
