//! Earth rotation and frame helpers for the analytic ephemeris.
//!
//! * [`gmst`] – Greenwich mean sidereal time from a UT1 Modified Julian Date,
//! * [`mean_obliquity`] – IAU 1976 mean obliquity of the ecliptic,
//! * [`nutation`] – low-precision nutation (4 leading terms, ≈0.5" accuracy),
//! * [`precession`] – IAU 1976 precession rotation from J2000 to the mean equator of date,
//! * [`nutation_aberration`] – apparent-place corrections of a mean equatorial position.
//!
//! Time arguments are MJD (`tjm`), TT unless stated otherwise.

use nalgebra::{Rotation3, Vector3};

use crate::constants::{Radian, DEG_PER_ARCSEC, DPI, RADEG};

/// MJD of J2000.0
pub const T2000: f64 = 51_544.5;

/// Arcseconds → radians
const RADSEC: f64 = DEG_PER_ARCSEC * RADEG;

/// Greenwich mean sidereal time (IAU 1982) in radians, normalised to `[0, 2π)`.
///
/// Arguments
/// -----------------
/// * `mjd_ut1`: Modified Julian Date in UT1.
///
/// Return
/// ----------
/// * GMST in radians.
pub fn gmst(mjd_ut1: f64) -> Radian {
    const C0: f64 = 24_110.548_41;
    const C1: f64 = 8_640_184.812_866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;
    // sidereal / solar day ratio
    const RAP: f64 = 1.002_737_909_34;

    let day = mjd_ut1.floor();
    let t = (day - T2000) / 36_525.0;
    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86_400.0;
    (gmst0 + (mjd_ut1 - day) * DPI * RAP).rem_euclid(DPI)
}

/// Mean obliquity of the ecliptic (IAU 1976), in radians.
pub fn mean_obliquity(tjm: f64) -> Radian {
    let t = (tjm - T2000) / 36_525.0;
    let ob0 = (23.0 * 3600.0 + 26.0 * 60.0 + 21.448) * RADSEC;
    ((0.001_81 * RADSEC * t - 0.000_6 * RADSEC) * t - 46.815 * RADSEC) * t + ob0
}

/// Nutation in longitude and obliquity, in radians.
///
/// Leading terms of the IAU 1980 series, in the truncated form used for almanac
/// work (Ω, 2L☉, 2L☾, 2Ω).
pub fn nutation(tjm: f64) -> (Radian, Radian) {
    let t = (tjm - T2000) / 36_525.0;
    let omega = (125.044_52 - 1_934.136_261 * t) * RADEG;
    let l_sun = (280.466_5 + 36_000.769_8 * t) * RADEG;
    let l_moon = (218.316_5 + 481_267.881_3 * t) * RADEG;

    let dpsi = -17.20 * omega.sin() - 1.32 * (2.0 * l_sun).sin() - 0.23 * (2.0 * l_moon).sin()
        + 0.21 * (2.0 * omega).sin();
    let deps = 9.20 * omega.cos() + 0.57 * (2.0 * l_sun).cos() + 0.10 * (2.0 * l_moon).cos()
        - 0.09 * (2.0 * omega).cos();
    (dpsi * RADSEC, deps * RADSEC)
}

/// Equation of the equinoxes Δψ·cos ε, in radians.
pub fn equation_of_equinoxes(tjm: f64) -> Radian {
    let (dpsi, _) = nutation(tjm);
    dpsi * mean_obliquity(tjm).cos()
}

/// Precession rotation from the J2000 mean equator to the mean equator of date.
///
/// `x_date = precession(tjm) * x_J2000`, composed of the three IAU 1976 rotations
/// ζ, θ, z.
pub fn precession(tjm: f64) -> Rotation3<f64> {
    let t = (tjm - T2000) / 36_525.0;
    let zeta = ((0.000_005_0 * t + 0.000_083_9) * t + 0.640_616_1) * t * RADEG;
    let z = ((0.000_005_1 * t + 0.000_304_1) * t + 0.640_616_1) * t * RADEG;
    let theta = ((-0.000_011_6 * t - 0.000_118_5) * t + 0.556_753_0) * t * RADEG;

    // active rotations: R3(-z)·R2(θ)·R3(-ζ) in frame-rotation notation
    let r_zeta = Rotation3::from_axis_angle(&Vector3::z_axis(), zeta);
    let r_theta = Rotation3::from_axis_angle(&Vector3::y_axis(), -theta);
    let r_z = Rotation3::from_axis_angle(&Vector3::z_axis(), z);
    r_z * r_theta * r_zeta
}

/// Rotation from J2000 ecliptic coordinates to J2000 equatorial coordinates.
pub fn ecliptic_to_equatorial_j2000() -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), mean_obliquity(T2000))
}

/// Right ascension and declination (radians) of a cartesian vector, RA in `[0, 2π)`.
pub fn to_ra_dec(v: &Vector3<f64>) -> (Radian, Radian) {
    let ra = v.y.atan2(v.x).rem_euclid(DPI);
    let dec = (v.z / v.norm()).asin();
    (ra, dec)
}

/// Apply nutation and annual aberration to a mean-of-date place.
///
/// Arguments
/// -----------------
/// * `ra`, `dec`: mean right ascension and declination of date, radians.
/// * `tjm`: MJD (TT).
/// * `sun_longitude`: geometric ecliptic longitude of the Sun, radians.
///
/// Return
/// ----------
/// * Apparent `(ra, dec)` in radians, with `ra` in `[0, 2π)`.
pub fn nutation_aberration(
    ra: Radian,
    dec: Radian,
    tjm: f64,
    sun_longitude: Radian,
) -> (Radian, Radian) {
    const KAPPA: f64 = 20.495_52 * RADSEC;
    let eps0 = mean_obliquity(tjm);
    let (dpsi, deps) = nutation(tjm);
    let eps = eps0 + deps;

    let (sa, ca) = ra.sin_cos();
    let (sd, cd) = dec.sin_cos();
    let td = dec.tan();
    let (se, ce) = eps.sin_cos();
    let (ss, cs) = sun_longitude.sin_cos();

    let dra_nut = (ce + se * sa * td) * dpsi - ca * td * deps;
    let ddec_nut = se * ca * dpsi + sa * deps;

    let dra_ab = -KAPPA * (ca * cs * ce + sa * ss) / cd;
    let ddec_ab = -KAPPA * (cs * ce * ((se / ce) * cd - sa * sd) + ca * sd * ss);

    ((ra + dra_nut + dra_ab).rem_euclid(DPI), dec + ddec_nut + ddec_ab)
}
