//! # Ephemeris collaborators
//!
//! The almanac core consumes two external capabilities, modelled as traits:
//!
//! * [`EphemerisProvider`] – apparent place of a body at an instant, and from it the
//!   topocentric altitude seen by an observer,
//! * [`EarthOrientation`] – DUT1 (UT1 − UTC) and ΔT (TT − UT1) corrections.
//!
//! ## Implementations
//! -----------------
//! * [`low_precision::LowPrecisionEphemeris`] – analytic Sun/Moon series, Keplerian planets
//!   and the [`star_catalog`] with precession, nutation and aberration. Accurate to a few
//!   tenths of an arcminute, which is the printed resolution.
//! * [`ModelEarthOrientation`] – polynomial ΔT and a constant DUT1.
//! * [`Ut1EarthOrientation`] – DUT1 read from a [`hifitime::ut1::Ut1Provider`], with the
//!   polynomial model as fallback outside the provider's coverage.
//!
//! Both traits are `Send + Sync` so a single provider can be shared by all workers
//! of a run through an [`Arc`](std::sync::Arc).

pub mod low_precision;
pub mod sidereal;
pub mod star_catalog;

use std::{
    fmt::Debug,
    sync::{Arc, RwLock},
};

use ahash::HashMap;
use hifitime::{ut1::Ut1Provider, Epoch};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    config::AlmanacConfig,
    constants::{Degree, Kilometer, RADEG, SECONDS_PER_DAY},
    observer::GeoLocation,
};

/// Normalise an angle to `[0, 360)`.
#[inline]
pub fn wrap360(angle: Degree) -> Degree {
    angle.rem_euclid(360.0)
}

/// Normalise an angle to `[-180, 180)`.
#[inline]
pub fn wrap180(angle: Degree) -> Degree {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Geocentric apparent place of a body, in the quantities the almanac tabulates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApparentPlace {
    /// Greenwich hour angle, degrees in `[0, 360)`
    pub gha: Degree,
    /// Apparent declination, degrees
    pub dec: Degree,
    /// Geocentric distance, km (0 for stars and Aries)
    pub distance_km: Kilometer,
    /// Angular semidiameter, degrees (0 for point sources)
    pub semidiameter: Degree,
    /// Equatorial horizontal parallax, degrees
    pub horizontal_parallax: Degree,
    /// Visual magnitude when meaningful
    pub magnitude: Option<f64>,
}

impl ApparentPlace {
    /// Sidereal hour angle `360° − RA`, derived from GHA and the GHA of Aries.
    pub fn sha(&self, gha_aries: Degree) -> Degree {
        wrap360(self.gha - gha_aries)
    }
}

/// Span of years a named ephemeris covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EphemerisSpan {
    De421,
    De405,
    De406,
}

impl EphemerisSpan {
    /// Inclusive first and last year.
    pub fn years(&self) -> (i32, i32) {
        match self {
            EphemerisSpan::De421 => (1900, 2050),
            EphemerisSpan::De405 => (1900, 2200),
            EphemerisSpan::De406 => (1900, 2750),
        }
    }

    /// Map the `EPHNDX` index (0, 1, 2) used in environment configuration.
    pub fn from_index(idx: u8) -> Result<Self, AlmanacError> {
        match idx {
            0 => Ok(EphemerisSpan::De421),
            1 => Ok(EphemerisSpan::De405),
            2 => Ok(EphemerisSpan::De406),
            _ => Err(AlmanacError::InvalidConfiguration(format!(
                "ephemeris index {idx} (expected 0, 1 or 2)"
            ))),
        }
    }

    pub fn check_year(&self, year: i32) -> Result<(), AlmanacError> {
        check_year_in(self.years(), year)
    }
}

pub(crate) fn check_year_in((min, max): (i32, i32), year: i32) -> Result<(), AlmanacError> {
    if year < min || year > max {
        Err(AlmanacError::EphemerisOutOfRange { year, min, max })
    } else {
        Ok(())
    }
}

/// Source of apparent places.
///
/// Implementors only need [`apparent_place`](EphemerisProvider::apparent_place) and
/// [`supported_years`](EphemerisProvider::supported_years); the topocentric altitude
/// used by the event search is derived from them.
pub trait EphemerisProvider: Send + Sync + Debug {
    /// Geocentric apparent place of `body` at `epoch` (UTC instant).
    ///
    /// Return
    /// ----------
    /// * The place, [`AlmanacError::EphemerisOutOfRange`] outside
    ///   [`supported_years`](EphemerisProvider::supported_years), or
    ///   [`AlmanacError::EphemerisFailure`] on an evaluation problem.
    fn apparent_place(&self, body: Body, epoch: Epoch) -> Result<ApparentPlace, AlmanacError>;

    /// Inclusive year range the provider can evaluate.
    fn supported_years(&self) -> (i32, i32);

    /// Topocentric altitude of the body centre in degrees, parallax included,
    /// refraction excluded.
    ///
    /// Arguments
    /// -----------------
    /// * `body`: the body.
    /// * `epoch`: UTC instant.
    /// * `observer`: observer location (east longitude positive).
    ///
    /// See also
    /// ------------
    /// * [`crate::search::EventSearch`] – root-finds this function against a threshold.
    fn altitude(
        &self,
        body: Body,
        epoch: Epoch,
        observer: &GeoLocation,
    ) -> Result<Degree, AlmanacError> {
        let place = self.apparent_place(body, epoch)?;
        Ok(topocentric_altitude(&place, observer))
    }

    /// Reject `year` when outside [`supported_years`](EphemerisProvider::supported_years).
    fn check_year(&self, year: i32) -> Result<(), AlmanacError> {
        check_year_in(self.supported_years(), year)
    }
}

/// Altitude of an apparent place for an observer, corrected for horizontal parallax.
pub fn topocentric_altitude(place: &ApparentPlace, observer: &GeoLocation) -> Degree {
    let lha = (place.gha + observer.longitude) * RADEG;
    let phi = observer.latitude * RADEG;
    let dec = place.dec * RADEG;
    let sin_h = phi.sin() * dec.sin() + phi.cos() * dec.cos() * lha.cos();
    let h = sin_h.clamp(-1.0, 1.0).asin();
    let parallax = ((place.horizontal_parallax * RADEG).sin() * h.cos()).asin();
    (h - parallax) / RADEG
}

/// Source of Earth-orientation corrections.
pub trait EarthOrientation: Send + Sync + Debug {
    /// `(DUT1, ΔT)` in seconds at `epoch`.
    fn dut1_deltat(&self, epoch: Epoch) -> (f64, f64);
}

/// Polynomial ΔT (Espenak & Meeus) with a fixed DUT1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelEarthOrientation {
    pub dut1: f64,
}

impl Default for ModelEarthOrientation {
    fn default() -> Self {
        ModelEarthOrientation { dut1: 0.0 }
    }
}

impl ModelEarthOrientation {
    /// ΔT = TT − UT1 in seconds for a decimal year.
    pub fn delta_t(year: f64) -> f64 {
        let y = year;
        match y {
            y if y < 1920.0 => {
                let t = y - 1900.0;
                -2.79 + 1.494_119 * t - 0.059_893_9 * t.powi(2) + 0.006_196_6 * t.powi(3)
                    - 0.000_197 * t.powi(4)
            }
            y if y < 1941.0 => {
                let t = y - 1920.0;
                21.20 + 0.844_93 * t - 0.076_100 * t.powi(2) + 0.002_093_6 * t.powi(3)
            }
            y if y < 1961.0 => {
                let t = y - 1950.0;
                29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
            }
            y if y < 1986.0 => {
                let t = y - 1975.0;
                45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
            }
            y if y < 2005.0 => {
                let t = y - 2000.0;
                63.86 + 0.3345 * t - 0.060_374 * t.powi(2)
                    + 0.001_727_5 * t.powi(3)
                    + 0.000_651_814 * t.powi(4)
                    + 0.000_023_735_99 * t.powi(5)
            }
            y if y < 2050.0 => {
                let t = y - 2000.0;
                62.92 + 0.322_17 * t + 0.005_589 * t.powi(2)
            }
            y if y < 2150.0 => {
                -20.0 + 32.0 * ((y - 1820.0) / 100.0).powi(2) - 0.5628 * (2150.0 - y)
            }
            y => {
                let u = (y - 1820.0) / 100.0;
                -20.0 + 32.0 * u * u
            }
        }
    }
}

fn decimal_year(epoch: Epoch) -> f64 {
    let (year, month, day, ..) = epoch.to_gregorian_utc();
    year as f64 + ((month as f64 - 1.0) + (day as f64 - 1.0) / 31.0) / 12.0
}

impl EarthOrientation for ModelEarthOrientation {
    fn dut1_deltat(&self, epoch: Epoch) -> (f64, f64) {
        (self.dut1, Self::delta_t(decimal_year(epoch)))
    }
}

/// DUT1 from IERS data through hifitime.
///
/// The provider is queried once per UTC day (at 00:00) and the result memoised.
/// When the provider has no data for a day (hifitime then returns UT1 = TAI), the
/// resulting DUT1 is out of the ±0.9 s band and the polynomial model is used.
#[derive(Debug)]
pub struct Ut1EarthOrientation {
    provider: Ut1Provider,
    fallback: ModelEarthOrientation,
    per_day: RwLock<HashMap<i64, (f64, f64)>>,
}

impl Ut1EarthOrientation {
    pub fn new(provider: Ut1Provider) -> Self {
        Ut1EarthOrientation {
            provider,
            fallback: ModelEarthOrientation::default(),
            per_day: RwLock::new(HashMap::default()),
        }
    }

    fn evaluate(&self, midnight: Epoch) -> (f64, f64) {
        let mjd_ut1 = midnight.to_ut1(&self.provider).to_mjd_tai_days();
        let dut1 = (mjd_ut1 - midnight.to_mjd_utc_days()) * 86_400.0;
        if dut1.is_finite() && dut1.abs() <= 0.9 {
            let tt_minus_utc = (midnight.to_jde_tt_days() - midnight.to_jde_utc_days()) * 86_400.0;
            (dut1, tt_minus_utc - dut1)
        } else {
            self.fallback.dut1_deltat(midnight)
        }
    }
}

impl EarthOrientation for Ut1EarthOrientation {
    fn dut1_deltat(&self, epoch: Epoch) -> (f64, f64) {
        let day = epoch.to_mjd_utc_days().floor() as i64;
        if let Some(v) = self.per_day.read().ok().and_then(|m| m.get(&day).copied()) {
            return v;
        }
        let midnight = Epoch::from_mjd_utc(day as f64);
        let v = self.evaluate(midnight);
        if let Ok(mut m) = self.per_day.write() {
            m.insert(day, v);
        }
        v
    }
}

/// IERS-derived UT1 data and the instant it was fetched.
#[derive(Debug, Clone)]
pub struct IersData {
    pub provider: Ut1Provider,
    pub fetched: Epoch,
}

impl IersData {
    /// Download the JPL `latest_eop2.long` Earth-orientation file.
    pub fn download() -> Result<Self, AlmanacError> {
        let provider = Ut1Provider::download_from_jpl("latest_eop2.long").map_err(|e| {
            AlmanacError::EphemerisFailure(format!("UT1 data download failed: {e}"))
        })?;
        let fetched = Epoch::now()
            .map_err(|e| AlmanacError::EphemerisFailure(format!("system clock: {e}")))?;
        Ok(IersData { provider, fetched })
    }

    /// Age of the data at `now`, in days.
    pub fn age_days(&self, now: Epoch) -> f64 {
        (now - self.fetched).to_seconds() / SECONDS_PER_DAY
    }
}

/// Earth-orientation collaborator of a run.
///
/// Arguments
/// -----------------
/// * `config`: `use_iers` enables the IERS data, `iers_max_age_days` bounds its age.
/// * `iers`: the IERS data, if any was obtained.
/// * `now`: reference instant for the age check.
///
/// Return
/// ----------
/// * A [`Ut1EarthOrientation`] over fresh IERS data, the polynomial
///   [`ModelEarthOrientation`] otherwise.
pub fn select_earth_orientation(
    config: &AlmanacConfig,
    iers: Option<IersData>,
    now: Epoch,
) -> Arc<dyn EarthOrientation> {
    match iers {
        Some(data) if config.use_iers => {
            let age = data.age_days(now);
            if age <= config.iers_max_age_days as f64 {
                info!("using IERS UT1 data ({age:.1} days old)");
                Arc::new(Ut1EarthOrientation::new(data.provider))
            } else {
                warn!(
                    "IERS data is {age:.1} days old (limit {}), using the ΔT model",
                    config.iers_max_age_days
                );
                Arc::new(ModelEarthOrientation::default())
            }
        }
        _ => {
            if config.use_iers {
                warn!("no IERS data available, using the ΔT model");
            }
            Arc::new(ModelEarthOrientation::default())
        }
    }
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wrap() {
        assert_abs_diff_eq!(wrap360(-10.0), 350.0);
        assert_abs_diff_eq!(wrap180(190.0), -170.0);
        assert_abs_diff_eq!(wrap180(-180.0), -180.0);
    }

    #[test]
    fn test_delta_t_model() {
        // Observed ΔT: 63.8 s in 2000, ~69 s in 2020
        assert_abs_diff_eq!(ModelEarthOrientation::delta_t(2000.0), 63.86, epsilon = 0.01);
        assert!((ModelEarthOrientation::delta_t(2020.0) - 71.6).abs() < 3.0);
        assert!(ModelEarthOrientation::delta_t(1900.5) < 0.0);
    }

    #[test]
    fn test_model_selected_without_iers() {
        let config = AlmanacConfig::builder().build().unwrap();
        let now = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
        let eop = select_earth_orientation(&config, None, now);
        let (dut1, delta_t) = eop.dut1_deltat(now);
        assert_eq!(dut1, 0.0);
        assert_abs_diff_eq!(
            delta_t,
            ModelEarthOrientation::default().dut1_deltat(now).1,
            epsilon = 1e-12
        );
        assert!(format!("{eop:?}").contains("ModelEarthOrientation"));
    }

    #[test]
    fn test_span_check() {
        assert!(EphemerisSpan::De421.check_year(2050).is_ok());
        assert_eq!(
            EphemerisSpan::De421.check_year(2051),
            Err(AlmanacError::EphemerisOutOfRange {
                year: 2051,
                min: 1900,
                max: 2050
            })
        );
        assert!(EphemerisSpan::from_index(3).is_err());
    }

    #[test]
    fn test_topocentric_altitude_zenith() {
        let place = ApparentPlace {
            gha: 0.0,
            dec: 40.0,
            distance_km: 0.0,
            semidiameter: 0.0,
            horizontal_parallax: 0.0,
            magnitude: None,
        };
        let obs = GeoLocation::new(40.0, 0.0).unwrap();
        assert_abs_diff_eq!(topocentric_altitude(&place, &obs), 90.0, epsilon = 1e-5);

        let moon_like = ApparentPlace {
            horizontal_parallax: 1.0,
            dec: 0.0,
            gha: 90.0,
            ..place
        };
        let eq = GeoLocation::new(0.0, 0.0).unwrap();
        assert_abs_diff_eq!(topocentric_altitude(&moon_like, &eq), -1.0, epsilon = 1e-9);
    }
}
