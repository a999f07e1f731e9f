//! # Observable sampler
//!
//! Builds, for one body and one UTC date, the hourly values tabulated on the daily
//! pages: Greenwich hour angle, declination, horizontal parallax, semidiameter,
//! magnitude and the `v`/`d` interpolation corrections.
//!
//! ## Day boundaries
//! -----------------
//! Besides the 24 values at 00h…23h, a sample set carries the GHA at the two instants
//! that bound the civil date once rounded to the display unit:
//!
//! ```text
//! start of day = D 00:00:00 − unit/2        end of day = D+1 00:00:00 − unit/2
//! ```
//!
//! These are the values the moon meridian-passage interpolation starts and ends with,
//! so that a passage found in the last half-unit of a day is attributed to the next one.
//!
//! ## Caching
//! -----------------
//! Sample sets are memoised per (date, body) in a [`TransientCache`]; the sampler is
//! owned by a single thread for the duration of a run.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::AlmanacError,
    bodies::{Body, StarId},
    cache::{CacheFamily, CacheKey, CacheStats, TransientCache},
    constants::{ArcMin, Degree, MOON_BASE_HOURLY_GHA, PLANET_BASE_HOURLY_GHA, SECONDS_PER_HOUR},
    ephemeris::{wrap180, wrap360, ApparentPlace, EphemerisProvider},
    format::Declination,
    lunar_distance::{distance_row, lunar_distance_bodies, place_vector, LunarDistanceRow},
    time::{CalendarDate, TimePrecision},
};

/// Hourly observables of one body on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySampleSet {
    pub body: Body,
    pub date: CalendarDate,
    /// GHA at 00h … 23h
    pub gha: [Degree; 24],
    /// Declination at 00h … 23h
    pub dec: [Degree; 24],
    /// Horizontal parallax at 00h … 23h
    pub hp: [Degree; 24],
    /// GHA at the rounded start of day
    pub gha_sod: Degree,
    /// GHA at the rounded end of day
    pub gha_eod: Degree,
    /// Hourly GHA excess over the body's base rate, arcminutes, for hours 0 … 23
    pub v: [ArcMin; 24],
    /// Hourly declination change, arcminutes, for hours 0 … 23
    pub d: [ArcMin; 24],
    /// Semidiameter at 12h
    pub semidiameter: Degree,
    /// Magnitude at 12h
    pub magnitude: Option<f64>,
    /// Display unit the day boundaries were rounded to
    pub boundary_precision: TimePrecision,
}

impl HourlySampleSet {
    /// Both declination representations of hour `h` (sign-based and hemisphere-based
    /// strings are derived from it).
    pub fn declination(&self, hour: usize) -> Declination {
        Declination(self.dec[hour])
    }

    /// Mean `v` over the day, arcminutes.
    pub fn v_mean(&self) -> ArcMin {
        self.v.iter().sum::<f64>() / 24.0
    }

    /// Mean `d` over the day, arcminutes (signed).
    pub fn d_mean(&self) -> ArcMin {
        self.d.iter().sum::<f64>() / 24.0
    }

    /// The 25-point GHA list `[start of day, 01h, …, 23h, end of day]` used for
    /// meridian-passage interpolation.
    pub fn passage_list(&self) -> [Degree; 25] {
        let mut list = [0.0; 25];
        list[0] = self.gha_sod;
        list[1..24].copy_from_slice(&self.gha[1..24]);
        list[24] = self.gha_eod;
        list
    }
}

/// Base hourly GHA rate the `v` correction is measured against.
fn base_rate(body: Body) -> Degree {
    match body {
        Body::Moon => MOON_BASE_HOURLY_GHA,
        _ => PLANET_BASE_HOURLY_GHA,
    }
}

/// Evaluate the sample set of `body` on `date` directly from the provider.
///
/// Arguments
/// -----------------
/// * `ephemeris`: apparent-place provider.
/// * `body`: the body (any, including stars and Aries).
/// * `date`: UTC date.
/// * `boundary_precision`: display unit of the day-boundary instants.
///
/// Return
/// ----------
/// * The sample set, or the first ephemeris error: there is no partial-day result.
pub fn compute_samples(
    ephemeris: &dyn EphemerisProvider,
    body: Body,
    date: CalendarDate,
    boundary_precision: TimePrecision,
) -> Result<HourlySampleSet, AlmanacError> {
    let places: Vec<ApparentPlace> = (0..=24)
        .map(|h| ephemeris.apparent_place(body, date.at_seconds(h as f64 * SECONDS_PER_HOUR)))
        .collect::<Result<_, _>>()?;

    let (sod, eod) = boundary_precision.day_window();
    let gha_sod = ephemeris.apparent_place(body, date.at_seconds(sod))?.gha;
    let gha_eod = ephemeris.apparent_place(body, date.at_seconds(eod))?.gha;

    let base = base_rate(body);
    let gha = std::array::from_fn(|h| places[h].gha);
    let dec = std::array::from_fn(|h| places[h].dec);
    let hp = std::array::from_fn(|h| places[h].horizontal_parallax);
    let v = std::array::from_fn(|h| {
        (wrap360(places[h + 1].gha - places[h].gha) - base) * 60.0
    });
    let d = std::array::from_fn(|h| (places[h + 1].dec - places[h].dec) * 60.0);

    Ok(HourlySampleSet {
        body,
        date,
        gha,
        dec,
        hp,
        gha_sod,
        gha_eod,
        v,
        d,
        semidiameter: places[12].semidiameter,
        magnitude: places[12].magnitude,
        boundary_precision,
    })
}

/// Moon hourly data with the upper and lower meridian-passage lists.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonObservables {
    pub samples: Arc<HourlySampleSet>,
    /// `[start of day, 01h … 23h, end of day]` GHA
    pub upper_gha: [Degree; 25],
    /// Same list for the anti-meridian (GHA + 180°)
    pub lower_gha: [Degree; 25],
}

impl MoonObservables {
    pub fn start_of_day_gha(&self) -> Degree {
        self.samples.gha_sod
    }

    pub fn end_of_day_gha(&self) -> Degree {
        self.samples.gha_eod
    }
}

/// Planet hourly data with its daily mean corrections.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetObservables {
    pub samples: Arc<HourlySampleSet>,
    pub v: ArcMin,
    pub d: ArcMin,
    pub magnitude: Option<f64>,
}

/// Sidereal hour angle and declination of a catalog star at 00h of a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarPlace {
    pub star: StarId,
    pub sha: Degree,
    pub dec: Degree,
}

/// Caching front-end over an [`EphemerisProvider`].
#[derive(Debug)]
pub struct ObservableSampler {
    ephemeris: Arc<dyn EphemerisProvider>,
    boundary_precision: TimePrecision,
    cache: TransientCache<CacheKey, Arc<HourlySampleSet>>,
}

impl ObservableSampler {
    pub fn new(ephemeris: Arc<dyn EphemerisProvider>, boundary_precision: TimePrecision) -> Self {
        ObservableSampler {
            ephemeris,
            boundary_precision,
            cache: TransientCache::new(),
        }
    }

    pub fn ephemeris(&self) -> &Arc<dyn EphemerisProvider> {
        &self.ephemeris
    }

    /// Hourly sample set of `body` on `date`, memoised.
    pub fn sample(
        &mut self,
        body: Body,
        date: CalendarDate,
    ) -> Result<Arc<HourlySampleSet>, AlmanacError> {
        self.ephemeris.check_year(date.year)?;
        let key = CacheKey::geocentric(date, body, CacheFamily::HourlySamples);
        let ephemeris = &self.ephemeris;
        let precision = self.boundary_precision;
        self.cache.get_or_compute(key, || {
            compute_samples(ephemeris.as_ref(), body, date, precision).map(Arc::new)
        })
    }

    /// Sun GHA, declination and hourly `d` for `date`.
    pub fn sun_observables(
        &mut self,
        date: CalendarDate,
    ) -> Result<Arc<HourlySampleSet>, AlmanacError> {
        self.sample(Body::Sun, date)
    }

    /// Moon hourly data with `v`, `d`, HP and the meridian-passage GHA lists.
    pub fn moon_observables(&mut self, date: CalendarDate) -> Result<MoonObservables, AlmanacError> {
        let samples = self.sample(Body::Moon, date)?;
        let upper_gha = samples.passage_list();
        let lower_gha = upper_gha.map(|g| wrap360(g + 180.0));
        Ok(MoonObservables {
            samples,
            upper_gha,
            lower_gha,
        })
    }

    /// Planet hourly data with its daily mean `v`, `d` and magnitude.
    pub fn planet_observables(
        &mut self,
        body: Body,
        date: CalendarDate,
    ) -> Result<PlanetObservables, AlmanacError> {
        if !body.is_planet() {
            return Err(AlmanacError::UnsupportedBody(format!(
                "{body} is not a tabulated planet"
            )));
        }
        let samples = self.sample(body, date)?;
        Ok(PlanetObservables {
            v: samples.v_mean(),
            d: samples.d_mean(),
            magnitude: samples.magnitude,
            samples,
        })
    }

    /// GHA of the first point of Aries at 00h … 23h.
    pub fn aries(&mut self, date: CalendarDate) -> Result<[Degree; 24], AlmanacError> {
        Ok(self.sample(Body::Aries, date)?.gha)
    }

    /// SHA and declination of the 57 catalog stars at 00h of `date`.
    pub fn star_places(&mut self, date: CalendarDate) -> Result<Vec<StarPlace>, AlmanacError> {
        self.ephemeris.check_year(date.year)?;
        let midnight = date.midnight();
        let aries = self.ephemeris.apparent_place(Body::Aries, midnight)?.gha;
        StarId::all()
            .map(|star| {
                let place = self.ephemeris.apparent_place(Body::Star(star), midnight)?;
                Ok(StarPlace {
                    star,
                    sha: place.sha(aries),
                    dec: place.dec,
                })
            })
            .collect()
    }

    /// Hourly lunar distances on `date` of the Sun, the planets and the bright stars,
    /// in [`lunar_distance_bodies`] order. Unusable hours are `None`.
    pub fn lunar_distances(
        &mut self,
        date: CalendarDate,
    ) -> Result<Vec<LunarDistanceRow>, AlmanacError> {
        let moon = self.place_vectors(Body::Moon, date)?;
        let sun = self.place_vectors(Body::Sun, date)?;
        lunar_distance_bodies()
            .map(|body| {
                let target = match body {
                    Body::Sun => sun.clone(),
                    _ => self.place_vectors(body, date)?,
                };
                let magnitude = self.sample(body, date)?.magnitude;
                Ok(distance_row(body, magnitude, &moon, &sun, &target))
            })
            .collect()
    }

    /// Place vectors at hours −1, 0, …, 24 of `date`.
    fn place_vectors(
        &mut self,
        body: Body,
        date: CalendarDate,
    ) -> Result<Vec<Vector3<f64>>, AlmanacError> {
        let samples = self.sample(body, date)?;
        let before = self.ephemeris.apparent_place(body, date.at_seconds(-SECONDS_PER_HOUR))?;
        let after = self
            .ephemeris
            .apparent_place(body, date.at_seconds(24.0 * SECONDS_PER_HOUR))?;
        Ok(std::iter::once(place_vector(before.gha, before.dec))
            .chain((0..24).map(|h| place_vector(samples.gha[h], samples.dec[h])))
            .chain(std::iter::once(place_vector(after.gha, after.dec)))
            .collect())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Signed difference of two hour angles, degrees in `[-180, 180)`.
pub fn gha_difference(a: Degree, b: Degree) -> Degree {
    wrap180(a - b)
}
