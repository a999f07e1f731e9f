//! # Low-precision analytic ephemeris
//!
//! A self-contained [`EphemerisProvider`] good to a few tenths of an arcminute, the
//! resolution printed in the daily pages.
//!
//! | Body | Model |
//! |---|---|
//! | Sun | mean elements with equation of centre, nutation and aberration in longitude |
//! | Moon | truncated ELP-2000/82 periodic series (main terms in longitude, latitude and distance) |
//! | Planets | Keplerian elements with secular rates (J2000 ecliptic), one light-time iteration |
//! | Stars | J2000 catalog place, precessed, with nutation and annual aberration |
//! | Aries | apparent sidereal time |
//!
//! The Greenwich hour angle of every body is `GAST − α`, GAST being evaluated in UT1
//! with the DUT1 supplied by the [`EarthOrientation`] collaborator.

use std::sync::Arc;

use hifitime::{Duration, Epoch};
use nalgebra::{Rotation3, Vector3};

use crate::{
    almanac_errors::AlmanacError,
    bodies::Body,
    constants::{
        Radian, AU, DAYS_PER_CENTURY, DPI, EARTH_RADIUS_KM, MOON_RADIUS_KM, RADEG,
        SUN_RADIUS_KM,
    },
    ephemeris::{
        sidereal::{
            ecliptic_to_equatorial_j2000, equation_of_equinoxes, gmst, mean_obliquity,
            nutation, nutation_aberration, precession, to_ra_dec, T2000,
        },
        wrap360, ApparentPlace, EarthOrientation, EphemerisProvider, EphemerisSpan,
    },
};

/// Light travel time for one AU, in days
const LIGHT_TIME_AU_DAYS: f64 = 0.005_775_518_3;

#[derive(Debug, Clone)]
pub struct LowPrecisionEphemeris {
    span: EphemerisSpan,
    eop: Arc<dyn EarthOrientation>,
}

impl LowPrecisionEphemeris {
    pub fn new(span: EphemerisSpan, eop: Arc<dyn EarthOrientation>) -> Self {
        LowPrecisionEphemeris { span, eop }
    }

    pub fn span(&self) -> EphemerisSpan {
        self.span
    }

    /// Apparent right ascension and declination (radians) plus distance.
    fn equatorial(&self, body: Body, tjm: f64) -> Result<(Radian, Radian, Distance), AlmanacError> {
        Ok(match body {
            Body::Sun => {
                let sun = sun_position(tjm);
                let (ra, dec) = sun.apparent_equatorial(tjm);
                (ra, dec, Distance::Au(sun.distance_au))
            }
            Body::Moon => {
                let moon = moon_position(tjm);
                let (ra, dec) = moon.apparent_equatorial(tjm);
                (ra, dec, Distance::Km(moon.distance_km))
            }
            Body::Venus | Body::Mars | Body::Jupiter | Body::Saturn => {
                let p = planet_position(body, tjm)?;
                (p.ra, p.dec, Distance::Planet(p))
            }
            Body::Aries => (0.0, 0.0, Distance::Infinite),
            Body::Star(id) => {
                let star = id.entry();
                let (sr, cr) = (star.ra * RADEG).sin_cos();
                let (sd, cd) = (star.dec * RADEG).sin_cos();
                let v = precession(tjm) * Vector3::new(cd * cr, cd * sr, sd);
                let (ra, dec) = to_ra_dec(&v);
                let (ra, dec) = nutation_aberration(ra, dec, tjm, sun_position(tjm).true_longitude);
                (ra, dec, Distance::Infinite)
            }
        })
    }
}

enum Distance {
    Au(f64),
    Km(f64),
    Planet(PlanetPosition),
    Infinite,
}

impl EphemerisProvider for LowPrecisionEphemeris {
    fn apparent_place(&self, body: Body, epoch: Epoch) -> Result<ApparentPlace, AlmanacError> {
        // the boundary samples of the first and last date spill over by up to a day
        let (year, ..) = epoch.to_gregorian_utc();
        if self.span.check_year(year).is_err() {
            let day = Duration::from_days(1.0);
            let (before, ..) = (epoch - day).to_gregorian_utc();
            let (after, ..) = (epoch + day).to_gregorian_utc();
            if self.span.check_year(before).is_err() && self.span.check_year(after).is_err() {
                self.span.check_year(year)?;
            }
        }

        let (dut1, _) = self.eop.dut1_deltat(epoch);
        let mjd_ut1 = epoch.to_mjd_utc_days() + dut1 / 86_400.0;
        let tjm = epoch.to_jde_tt_days() - 2_400_000.5;
        let gast = (gmst(mjd_ut1) + equation_of_equinoxes(tjm)) / RADEG;

        let (ra, dec, distance) = self.equatorial(body, tjm)?;
        if !ra.is_finite() || !dec.is_finite() {
            return Err(AlmanacError::EphemerisFailure(format!(
                "non-finite place for {body} at {epoch}"
            )));
        }

        let disk = |radius_km: f64, distance_km: f64| {
            (
                (radius_km / distance_km).asin() / RADEG,
                (EARTH_RADIUS_KM / distance_km).asin() / RADEG,
            )
        };

        let (distance_km, semidiameter, horizontal_parallax, magnitude) = match distance {
            Distance::Au(r) => {
                let km = r * AU;
                let (sd, hp) = disk(SUN_RADIUS_KM, km);
                (km, sd, hp, None)
            }
            Distance::Km(km) => {
                let (sd, hp) = disk(MOON_RADIUS_KM, km);
                (km, sd, hp, None)
            }
            Distance::Planet(p) => {
                let km = p.delta_au * AU;
                let (_, hp) = disk(0.0, km);
                (km, 0.0, hp, Some(p.magnitude))
            }
            Distance::Infinite => (
                0.0,
                0.0,
                0.0,
                match body {
                    Body::Star(id) => Some(id.entry().magnitude),
                    _ => None,
                },
            ),
        };

        Ok(ApparentPlace {
            gha: wrap360(gast - ra / RADEG),
            dec: dec / RADEG,
            distance_km,
            semidiameter,
            horizontal_parallax,
            magnitude,
        })
    }

    fn supported_years(&self) -> (i32, i32) {
        self.span.years()
    }
}

// -------------------------------------------------------------------------------------------------
// Sun
// -------------------------------------------------------------------------------------------------

pub(crate) struct SunPosition {
    /// Geometric longitude, mean equinox of date (rad)
    pub true_longitude: Radian,
    /// Apparent longitude (rad)
    pub apparent_longitude: Radian,
    pub distance_au: f64,
    /// Longitude of the Moon's ascending node (rad)
    pub omega: Radian,
}

impl SunPosition {
    pub fn apparent_equatorial(&self, tjm: f64) -> (Radian, Radian) {
        let eps = mean_obliquity(tjm) + 0.002_56 * RADEG * self.omega.cos();
        let (sl, cl) = self.apparent_longitude.sin_cos();
        let ra = (eps.cos() * sl).atan2(cl).rem_euclid(DPI);
        let dec = (eps.sin() * sl).asin();
        (ra, dec)
    }
}

pub(crate) fn sun_position(tjm: f64) -> SunPosition {
    let t = (tjm - T2000) / DAYS_PER_CENTURY;
    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t) * RADEG;
    let e = 0.016_708_634 - 0.000_042_037 * t - 0.000_000_126_7 * t * t;
    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();
    let true_longitude = l0 + c;
    let nu = m + c * RADEG;
    let distance_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * nu.cos());
    let omega = (125.04 - 1_934.136 * t) * RADEG;
    let apparent = true_longitude - 0.005_69 - 0.004_78 * omega.sin();
    SunPosition {
        true_longitude: wrap360(true_longitude) * RADEG,
        apparent_longitude: wrap360(apparent) * RADEG,
        distance_au,
        omega,
    }
}

// -------------------------------------------------------------------------------------------------
// Moon
// -------------------------------------------------------------------------------------------------

/// Multipliers of (D, M, M', F) with coefficients of Σl (1e-6 °) and Σr (1e-3 km).
const MOON_LON_DIST: [(i8, i8, i8, i8, f64, f64); 32] = [
    (0, 0, 1, 0, 6_288_774., -20_905_355.),
    (2, 0, -1, 0, 1_274_027., -3_699_111.),
    (2, 0, 0, 0, 658_314., -2_955_968.),
    (0, 0, 2, 0, 213_618., -569_925.),
    (0, 1, 0, 0, -185_116., 48_888.),
    (0, 0, 0, 2, -114_332., -3_149.),
    (2, 0, -2, 0, 58_793., 246_158.),
    (2, -1, -1, 0, 57_066., -152_138.),
    (2, 0, 1, 0, 53_322., -170_733.),
    (2, -1, 0, 0, 45_758., -204_586.),
    (0, 1, -1, 0, -40_923., -129_620.),
    (1, 0, 0, 0, -34_720., 108_743.),
    (0, 1, 1, 0, -30_383., 104_755.),
    (2, 0, 0, -2, 15_327., 10_321.),
    (0, 0, 1, 2, -12_528., 0.),
    (0, 0, 1, -2, 10_980., 79_661.),
    (4, 0, -1, 0, 10_675., -34_782.),
    (0, 0, 3, 0, 10_034., -23_210.),
    (4, 0, -2, 0, 8_548., -21_636.),
    (2, 1, -1, 0, -7_888., 24_208.),
    (2, 1, 0, 0, -6_766., 30_824.),
    (1, 0, -1, 0, -5_163., -8_379.),
    (1, 1, 0, 0, 4_987., -16_675.),
    (2, -1, 1, 0, 4_036., -12_831.),
    (2, 0, 2, 0, 3_994., -10_445.),
    (4, 0, 0, 0, 3_861., -11_650.),
    (2, 0, -3, 0, 3_665., 14_403.),
    (0, 1, -2, 0, -2_689., -7_003.),
    (2, 0, -1, 2, -2_602., 0.),
    (2, -1, -2, 0, 2_390., 10_056.),
    (1, 0, 1, 0, -2_348., 6_322.),
    (2, -2, 0, 0, 2_236., -9_884.),
];

/// Multipliers of (D, M, M', F) with coefficients of Σb (1e-6 °).
const MOON_LAT: [(i8, i8, i8, i8, f64); 20] = [
    (0, 0, 0, 1, 5_128_122.),
    (0, 0, 1, 1, 280_602.),
    (0, 0, 1, -1, 277_693.),
    (2, 0, 0, -1, 173_237.),
    (2, 0, -1, 1, 55_413.),
    (2, 0, -1, -1, 46_271.),
    (2, 0, 0, 1, 32_573.),
    (0, 0, 2, 1, 17_198.),
    (2, 0, 1, -1, 9_266.),
    (0, 0, 2, -1, 8_822.),
    (2, -1, 0, -1, 8_216.),
    (2, 0, -2, -1, 4_324.),
    (2, 0, 1, 1, 4_200.),
    (2, 1, 0, -1, -3_359.),
    (2, -1, -1, 1, 2_463.),
    (2, -1, 0, 1, 2_211.),
    (2, -1, -1, -1, 2_065.),
    (0, 1, -1, -1, -1_870.),
    (4, 0, -1, -1, 1_828.),
    (0, 1, 0, 1, -1_794.),
];

pub(crate) struct MoonPosition {
    /// Geocentric ecliptic longitude, mean equinox of date (rad)
    pub longitude: Radian,
    /// Geocentric ecliptic latitude (rad)
    pub latitude: Radian,
    pub distance_km: f64,
}

impl MoonPosition {
    pub fn apparent_equatorial(&self, tjm: f64) -> (Radian, Radian) {
        let (dpsi, deps) = nutation(tjm);
        let eps = mean_obliquity(tjm) + deps;
        let lambda = self.longitude + dpsi;
        let beta = self.latitude;
        let (sl, cl) = lambda.sin_cos();
        let (se, ce) = eps.sin_cos();
        let ra = (sl * ce - beta.tan() * se).atan2(cl).rem_euclid(DPI);
        let dec = (beta.sin() * ce + beta.cos() * se * sl).asin();
        (ra, dec)
    }
}

pub(crate) fn moon_position(tjm: f64) -> MoonPosition {
    let t = (tjm - T2000) / DAYS_PER_CENTURY;
    let lp = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t;
    let d = (297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t) * RADEG;
    let m = (357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t * t) * RADEG;
    let mp = (134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t) * RADEG;
    let f = (93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t) * RADEG;
    let e = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;

    let eccentricity = |m_mult: i8| match m_mult.abs() {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };
    let arg = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        cd as f64 * d + cm as f64 * m + cmp as f64 * mp + cf as f64 * f
    };

    let (mut sl, sr) = MOON_LON_DIST
        .iter()
        .fold((0.0, 0.0), |(sl, sr), &(cd, cm, cmp, cf, l, r)| {
            let a = arg(cd, cm, cmp, cf);
            let ecc = eccentricity(cm);
            (sl + l * ecc * a.sin(), sr + r * ecc * a.cos())
        });
    let mut sb = MOON_LAT
        .iter()
        .map(|&(cd, cm, cmp, cf, b)| b * eccentricity(cm) * arg(cd, cm, cmp, cf).sin())
        .sum::<f64>();

    let a1 = (119.75 + 131.849 * t) * RADEG;
    let a2 = (53.09 + 479_264.29 * t) * RADEG;
    let a3 = (313.45 + 481_266.484 * t) * RADEG;
    let lp_rad = lp * RADEG;
    sl += 3_958.0 * a1.sin() + 1_962.0 * (lp_rad - f).sin() + 318.0 * a2.sin();
    sb += -2_235.0 * lp_rad.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f).sin()
        + 175.0 * (a1 + f).sin()
        + 127.0 * (lp_rad - mp).sin()
        - 115.0 * (lp_rad + mp).sin();

    MoonPosition {
        longitude: wrap360(lp + sl / 1e6) * RADEG,
        latitude: (sb / 1e6) * RADEG,
        distance_km: 385_000.56 + sr / 1_000.0,
    }
}

// -------------------------------------------------------------------------------------------------
// Planets
// -------------------------------------------------------------------------------------------------

/// Keplerian elements at J2000 and rates per Julian century:
/// a (AU), e, I (°), L (°), ϖ (°), Ω (°).
struct Elements {
    base: [f64; 6],
    rate: [f64; 6],
}

const EM_BARY: Elements = Elements {
    base: [1.000_002_61, 0.016_711_23, -0.000_015_31, 100.464_571_66, 102.937_681_93, 0.0],
    rate: [0.000_005_62, -0.000_043_92, -0.012_946_68, 35_999.372_449_81, 0.323_273_64, 0.0],
};

const VENUS: Elements = Elements {
    base: [0.723_335_66, 0.006_776_72, 3.394_676_05, 181.979_099_50, 131.602_467_18, 76.679_842_55],
    rate: [0.000_003_90, -0.000_041_07, -0.000_788_90, 58_517.815_387_29, 0.002_683_29, -0.277_694_18],
};

const MARS: Elements = Elements {
    base: [1.523_710_34, 0.093_394_10, 1.849_691_42, -4.553_432_05, -23.943_629_59, 49.559_538_91],
    rate: [0.000_018_47, 0.000_078_82, -0.008_131_31, 19_140.302_684_99, 0.444_410_88, -0.292_573_43],
};

const JUPITER: Elements = Elements {
    base: [5.202_887_00, 0.048_386_24, 1.304_396_95, 34.396_440_51, 14.728_479_83, 100.473_909_09],
    rate: [-0.000_116_07, -0.000_132_53, -0.001_837_14, 3_034.746_127_75, 0.212_526_68, 0.204_691_06],
};

const SATURN: Elements = Elements {
    base: [9.536_675_94, 0.053_861_79, 2.485_991_87, 49.954_244_23, 92.598_878_31, 113.662_424_48],
    rate: [-0.001_250_60, -0.000_509_91, 0.001_936_09, 1_222.493_622_01, -0.418_972_16, -0.288_677_94],
};

/// Solve Kepler's equation `E − e·sin E = M` by Newton iteration (radians).
pub(crate) fn solve_kepler(mean_anomaly: Radian, e: f64) -> Radian {
    let m = (mean_anomaly + std::f64::consts::PI).rem_euclid(DPI) - std::f64::consts::PI;
    let mut ecc_anomaly = m + e * m.sin();
    for _ in 0..20 {
        let delta = (ecc_anomaly - e * ecc_anomaly.sin() - m) / (1.0 - e * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ecc_anomaly
}

/// Heliocentric J2000 ecliptic position (AU).
fn heliocentric(elements: &Elements, t: f64) -> Vector3<f64> {
    let [a, e, incl, l, varpi, node]: [f64; 6] =
        std::array::from_fn(|i| elements.base[i] + elements.rate[i] * t);
    let omega = (varpi - node) * RADEG;
    let ecc_anomaly = solve_kepler((l - varpi) * RADEG, e);

    let orbital = Vector3::new(
        a * (ecc_anomaly.cos() - e),
        a * (1.0 - e * e).sqrt() * ecc_anomaly.sin(),
        0.0,
    );
    let to_ecliptic = Rotation3::from_axis_angle(&Vector3::z_axis(), node * RADEG)
        * Rotation3::from_axis_angle(&Vector3::x_axis(), incl * RADEG)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), omega);
    to_ecliptic * orbital
}

pub(crate) struct PlanetPosition {
    pub ra: Radian,
    pub dec: Radian,
    pub delta_au: f64,
    pub magnitude: f64,
}

fn planet_position(body: Body, tjm: f64) -> Result<PlanetPosition, AlmanacError> {
    let elements = match body {
        Body::Venus => &VENUS,
        Body::Mars => &MARS,
        Body::Jupiter => &JUPITER,
        Body::Saturn => &SATURN,
        other => return Err(AlmanacError::UnsupportedBody(other.to_string())),
    };
    let t = (tjm - T2000) / DAYS_PER_CENTURY;
    let earth = heliocentric(&EM_BARY, t);

    let mut planet = heliocentric(elements, t);
    let mut geo = planet - earth;
    // one light-time iteration is enough at 0.1'
    let tau = LIGHT_TIME_AU_DAYS * geo.norm();
    planet = heliocentric(elements, t - tau / DAYS_PER_CENTURY);
    geo = planet - earth;

    let r = planet.norm();
    let delta = geo.norm();
    let big_r = earth.norm();

    let v = precession(tjm) * (ecliptic_to_equatorial_j2000() * geo);
    let (ra, dec) = to_ra_dec(&v);
    let (ra, dec) = nutation_aberration(ra, dec, tjm, sun_position(tjm).true_longitude);

    let cos_i = ((r * r + delta * delta - big_r * big_r) / (2.0 * r * delta)).clamp(-1.0, 1.0);
    let phase = cos_i.acos() / RADEG;
    let base = 5.0 * (r * delta).log10();
    let magnitude = match body {
        Body::Venus => {
            -4.40 + base + 0.000_9 * phase + 0.000_239 * phase.powi(2)
                - 0.000_000_65 * phase.powi(3)
        }
        Body::Mars => -1.52 + base + 0.016 * phase,
        Body::Jupiter => -9.40 + base + 0.005 * phase,
        // ring tilt neglected
        _ => -8.88 + base + 0.044 * phase,
    };

    Ok(PlanetPosition {
        ra,
        dec,
        delta_au: delta,
        magnitude,
    })
}
