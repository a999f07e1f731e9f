//! # Constants and type definitions for navalmanac
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the crate, together with the standard latitude table of the
//! twilight and moonrise/moonset tables.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, days ↔ seconds, AU ↔ km)
//! - Horizon thresholds used by the event search engine
//! - Core type aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of seconds in an hour
pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Julian Date of J2000.0 (2000-01-01 12:00:00 TT)
pub const J2000_JD: f64 = 2_451_545.0;

/// Days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → degrees
pub const DEG_PER_ARCSEC: f64 = 1.0 / 3600.0;

/// Earth equatorial radius in kilometers (GRS1980/WGS84)
pub const EARTH_RADIUS_KM: f64 = 6_378.137;

/// Mean lunar radius in kilometers
pub const MOON_RADIUS_KM: f64 = 1_737.4;

/// IAU 2015 nominal solar radius in kilometers
pub const SUN_RADIUS_KM: f64 = 696_000.0;

/// Mean obliquity of the ecliptic at J2000.0, in degrees
pub const OBLIQUITY_J2000: Degree = 23.439_291_11;

// -------------------------------------------------------------------------------------------------
// Horizon thresholds
// -------------------------------------------------------------------------------------------------

/// Standard atmospheric refraction at the horizon (34 arcminutes), in degrees
pub const REFRACTION_HORIZON: Degree = 34.0 / 60.0;

/// Conventional solar semidiameter used when the ephemeris gives none (16 arcminutes)
pub const SUN_SEMIDIAMETER_DEFAULT: Degree = 16.0 / 60.0;

/// Depression of the Sun's centre at civil twilight
pub const CIVIL_TWILIGHT_DEPRESSION: Degree = 6.0;

/// Depression of the Sun's centre at nautical twilight
pub const NAUTICAL_TWILIGHT_DEPRESSION: Degree = 12.0;

/// Hourly GHA increment the almanac `v` correction is measured against, for the Moon (14°19.0')
pub const MOON_BASE_HOURLY_GHA: Degree = 14.0 + 19.0 / 60.0;

/// Hourly GHA increment the almanac `v` correction is measured against, for the planets (15°)
pub const PLANET_BASE_HOURLY_GHA: Degree = 15.0;

// -------------------------------------------------------------------------------------------------
// Tables
// -------------------------------------------------------------------------------------------------

/// Latitudes tabulated in the twilight and moonrise/moonset tables, north to south.
///
/// The table builders expect exactly [`STANDARD_LATITUDE_COUNT`] entries.
pub const STANDARD_LATITUDES: [Degree; 31] = [
    72.0, 70.0, 68.0, 66.0, 64.0, 62.0, 60.0, 58.0, 56.0, 54.0, 52.0, 50.0, 45.0, 40.0, 35.0,
    30.0, 20.0, 10.0, 0.0, -10.0, -20.0, -30.0, -35.0, -40.0, -45.0, -50.0, -52.0, -54.0, -56.0,
    -58.0, -60.0,
];

/// Number of latitudes a table expects
pub const STANDARD_LATITUDE_COUNT: usize = 31;

/// Days covered by one nautical almanac double page
pub const NAUTICAL_DAYS_PER_PAGE: usize = 3;

/// Days covered by one event-time page
pub const EVENT_TIME_DAYS_PER_PAGE: usize = 2;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcminutes
pub type ArcMin = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Seconds relative to 00:00 UTC of a calendar date
pub type DaySeconds = f64;
