//! # navalmanac
//!
//! Computational core of a printable nautical almanac: hourly ephemeris sampling,
//! the daily-event search (sunrise/sunset, twilight, moonrise/moonset, meridian
//! passages) and the run machinery that distributes the per-latitude searches over a
//! worker pool.
//!
//! Typical use:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hifitime::Epoch;
//! use navalmanac::{
//!     ephemeris::{select_earth_orientation, IersData},
//!     AlmanacConfig, AlmanacRun, DaySpan, LowPrecisionEphemeris,
//! };
//!
//! let config = AlmanacConfig::from_env().unwrap();
//! let iers = config.use_iers.then(IersData::download).and_then(Result::ok);
//! let eop = select_earth_orientation(&config, iers, Epoch::now().unwrap());
//! let ephemeris = Arc::new(LowPrecisionEphemeris::new(config.ephemeris_span, eop.clone()));
//! let mut run = AlmanacRun::new(config, ephemeris, eop).unwrap();
//! let pages = run.nautical_pages(DaySpan::Month { year: 2025, month: 1 }).unwrap();
//! println!("{} pages, {}", pages.len(), run.finish());
//! ```
//!
//! The presentation layer (table markup, paper layouts) is not part of this crate; it
//! consumes [`run::NauticalPage`] / [`run::EventTimePage`] and the formatting helpers
//! of [`format`].

pub mod almanac_errors;
pub mod bodies;
pub mod cache;
pub mod config;
pub mod constants;
pub mod distributor;
pub mod ephemeris;
pub mod format;
pub mod lunar_distance;
pub mod observer;
pub mod run;
pub mod sampler;
pub mod search;
pub mod time;

pub use crate::{
    almanac_errors::AlmanacError,
    bodies::{Body, StarId},
    config::{AlmanacConfig, AlmanacConfigBuilder, PaperSize, TableStyle},
    distributor::{Distributor, WorkDistributor},
    ephemeris::{
        low_precision::LowPrecisionEphemeris, ApparentPlace, EarthOrientation, EphemerisProvider,
        EphemerisSpan, ModelEarthOrientation, Ut1EarthOrientation,
    },
    lunar_distance::{LunarDistanceRow, LunarDistanceStrategy},
    observer::{GeoLocation, Hemisphere},
    run::{AlmanacRun, DaySpan, RunStats},
    sampler::ObservableSampler,
    search::{DayEvents, Event, EventCell, EventFamily, EventKind, EventSearch, HorizonState},
    time::{CalendarDate, DisplayTime, TimePrecision},
};
