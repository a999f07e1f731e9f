//! # Run configuration
//!
//! [`AlmanacConfig`] gathers every setting a run needs. It is validated once by
//! [`AlmanacConfigBuilder::build`] (or [`AlmanacConfig::from_env`]) and then owned by
//! the [`AlmanacRun`](crate::run::AlmanacRun); nothing reads process-wide settings
//! afterwards.
//!
//! ## Environment overrides
//! -----------------
//! | Variable | Field | Values |
//! |---|---|---|
//! | `PGSZ` | [`paper`](AlmanacConfig::paper) | `A4`, `Letter` |
//! | `EPHNDX` | [`ephemeris_span`](AlmanacConfig::ephemeris_span) | `0` (DE421), `1` (DE405), `2` (DE406) |
//! | `USEIERS` | [`use_iers`](AlmanacConfig::use_iers) | `true`/`false` |
//! | `AGEIERS` | [`iers_max_age_days`](AlmanacConfig::iers_max_age_days) | days, > 0 |
//! | `MULTIPR` | [`parallel`](AlmanacConfig::parallel) | `true`/`false` |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    constants::{STANDARD_LATITUDES, STANDARD_LATITUDE_COUNT},
    ephemeris::EphemerisSpan,
    format::DeclinationFormat,
    observer::MAX_LATITUDE,
    time::TimePrecision,
};

/// Layout family of the printed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStyle {
    Traditional,
    Modern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
}

impl FromStr for PaperSize {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            other => Err(AlmanacError::InvalidConfiguration(format!(
                "paper size '{other}' (expected A4 or Letter)"
            ))),
        }
    }
}

/// Settings of one almanac run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlmanacConfig {
    /// Latitudes of the twilight and moonrise tables, exactly 31 values
    pub latitudes: Vec<f64>,
    /// Distribute latitudes over a worker pool
    pub parallel: bool,
    /// Upper bound on the pool size
    pub max_workers: usize,
    pub ephemeris_span: EphemerisSpan,
    pub table_style: TableStyle,
    pub declination_format: DeclinationFormat,
    pub paper: PaperSize,
    /// Display unit of rise/set and twilight times on nautical pages
    pub event_precision: TimePrecision,
    /// Read DUT1 from IERS data instead of the model
    pub use_iers: bool,
    /// Age after which IERS data is considered stale, days
    pub iers_max_age_days: u32,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        AlmanacConfig {
            latitudes: STANDARD_LATITUDES.to_vec(),
            parallel: true,
            max_workers: 12,
            ephemeris_span: EphemerisSpan::De421,
            table_style: TableStyle::Traditional,
            declination_format: DeclinationFormat::Hemisphere,
            paper: PaperSize::A4,
            event_precision: TimePrecision::Minute,
            use_iers: true,
            iers_max_age_days: 30,
        }
    }
}

impl AlmanacConfig {
    pub fn builder() -> AlmanacConfigBuilder {
        AlmanacConfigBuilder::new()
    }

    /// Defaults overlaid with the `PGSZ`, `EPHNDX`, `USEIERS`, `AGEIERS` and `MULTIPR`
    /// environment variables, validated.
    pub fn from_env() -> Result<Self, AlmanacError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](AlmanacConfig::from_env) with an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AlmanacError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut builder = AlmanacConfigBuilder::new();
        if let Some(v) = lookup("PGSZ") {
            builder = builder.paper(v.parse()?);
        }
        if let Some(v) = lookup("EPHNDX") {
            let idx = v.trim().parse::<u8>().map_err(|_| {
                AlmanacError::InvalidConfiguration(format!("EPHNDX '{v}' is not an index"))
            })?;
            builder = builder.ephemeris_span(EphemerisSpan::from_index(idx)?);
        }
        if let Some(v) = lookup("USEIERS") {
            builder = builder.use_iers(parse_flag("USEIERS", &v)?);
        }
        if let Some(v) = lookup("AGEIERS") {
            let days = v.trim().parse::<u32>().map_err(|_| {
                AlmanacError::InvalidConfiguration(format!("AGEIERS '{v}' is not a day count"))
            })?;
            builder = builder.iers_max_age_days(days);
        }
        if let Some(v) = lookup("MULTIPR") {
            builder = builder.parallel(parse_flag("MULTIPR", &v)?);
        }
        builder.build()
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, AlmanacError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AlmanacError::InvalidConfiguration(format!(
            "{name} '{value}' is not a boolean"
        ))),
    }
}

/// Fluent builder for [`AlmanacConfig`].
#[derive(Debug, Clone, Default)]
pub struct AlmanacConfigBuilder {
    config: AlmanacConfig,
}

impl AlmanacConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latitudes(mut self, v: Vec<f64>) -> Self {
        self.config.latitudes = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.config.parallel = v;
        self
    }
    pub fn max_workers(mut self, v: usize) -> Self {
        self.config.max_workers = v;
        self
    }
    pub fn ephemeris_span(mut self, v: EphemerisSpan) -> Self {
        self.config.ephemeris_span = v;
        self
    }
    pub fn table_style(mut self, v: TableStyle) -> Self {
        self.config.table_style = v;
        self
    }
    pub fn declination_format(mut self, v: DeclinationFormat) -> Self {
        self.config.declination_format = v;
        self
    }
    pub fn paper(mut self, v: PaperSize) -> Self {
        self.config.paper = v;
        self
    }
    pub fn event_precision(mut self, v: TimePrecision) -> Self {
        self.config.event_precision = v;
        self
    }
    pub fn use_iers(mut self, v: bool) -> Self {
        self.config.use_iers = v;
        self
    }
    pub fn iers_max_age_days(mut self, v: u32) -> Self {
        self.config.iers_max_age_days = v;
        self
    }

    /// Validate and return the configuration.
    ///
    /// Checks
    /// -----------------
    /// * exactly 31 latitudes ([`AlmanacError::InvalidLatitudeList`]),
    /// * each latitude finite and within ±89.9° ([`AlmanacError::InvalidLatitude`]),
    /// * `max_workers ≥ 1` and `iers_max_age_days ≥ 1`.
    pub fn build(self) -> Result<AlmanacConfig, AlmanacError> {
        let c = self.config;
        if c.latitudes.len() != STANDARD_LATITUDE_COUNT {
            return Err(AlmanacError::InvalidLatitudeList(c.latitudes.len()));
        }
        if let Some(&bad) = c
            .latitudes
            .iter()
            .find(|lat| !lat.is_finite() || lat.abs() > MAX_LATITUDE)
        {
            return Err(AlmanacError::InvalidLatitude(bad));
        }
        if c.max_workers == 0 {
            return Err(AlmanacError::InvalidConfiguration(
                "max_workers must be at least 1".into(),
            ));
        }
        if c.iers_max_age_days == 0 {
            return Err(AlmanacError::InvalidConfiguration(
                "iers_max_age_days must be at least 1".into(),
            ));
        }
        Ok(c)
    }
}
